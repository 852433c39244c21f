//! fints - FinTS/HBCI message security and framing
//!
//! This library implements the layer of the FinTS client protocol that turns
//! a list of business segments into a secured, size-stamped message.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `fints-core`: error type, wire syntax and security formals
//! - `fints-segment`: segment model, field schemas, typed and legacy segments, message model
//! - `fints-security`: PIN/TAN encryption envelope, two-phase signature, TAN challenge decoders
//!
//! Transport, the business segment catalogue and the dialog state machine
//! live outside this workspace.
//!
//! # Usage
//!
//! ```no_run
//! use fints::{Credentials, DialogContext, SecuredMessageBuilder};
//! use fints::security::{PinTanDummyEncryptionMechanism, PinTanOneStepAuthenticationMechanism};
//! use std::sync::Arc;
//!
//! let context = Arc::new(DialogContext::new("12345678", "user"));
//! let mut encryption = PinTanDummyEncryptionMechanism::new();
//! let mut authentication = PinTanOneStepAuthenticationMechanism::new();
//!
//! let bytes = SecuredMessageBuilder::new(context)
//!     .encryption(&mut encryption)
//!     .authentication(&mut authentication)
//!     .encode(&Credentials::new("1234"))?;
//! # Ok::<(), fints::FintsError>(())
//! ```

pub mod assembly;

// Re-export core types
pub use fints_core::{ContractViolation, FintsError, FintsResult};
pub use fints_core::syntax;

// Re-export segment and message model
pub use fints_segment::{DialogContext, Element, Message, Segment, SegmentHeader};

pub use fints_security::Credentials;
pub use assembly::SecuredMessageBuilder;

// Re-export formals
pub mod formals {
    pub use fints_core::formals::*;
}

// Re-export segment API
pub mod segment {
    pub use fints_segment::*;
}

// Re-export security mechanisms and challenge decoders
pub mod security {
    pub use fints_security::*;
}
