//! Segment and message framing for FinTS/HBCI
//!
//! This crate turns segments into wire text and back, describes segment
//! types as field schemas, and models a complete message with its size.
//!
//! # Layers
//! - [`element`] / [`segment`]: the generic wire model and tokenizer
//! - [`schema`]: one schema per segment type, shared by the
//!   [`positional`] and [`named`] adapters
//! - [`segments`]: typed framing and security segments
//! - [`legacy`]: positional constructors for older call sites
//! - [`message`]: the message model

pub use fints_core::error;

pub mod element;
pub mod segment;
pub mod schema;
pub mod positional;
pub mod named;
pub mod groups;
pub mod segments;
pub mod legacy;
pub mod message;

pub use error::{ContractViolation, FintsError, FintsResult};
pub use element::Element;
pub use segment::{Segment, SegmentHeader};
pub use schema::{FieldDef, FieldType, FieldValue, NamedFields, SegmentSchema};
pub use positional::{decode_positional, encode_positional};
pub use named::{decode_named, encode_named};
pub use groups::GroupRecord;
pub use segments::*;
pub use message::{DialogContext, Message};
