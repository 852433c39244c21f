//! Security module for the FinTS/HBCI protocol
//!
//! This crate provides the security mechanisms a message passes through
//! before it is handed to transport:
//!
//! - [`encryption`]: the encryption envelope (`HNVSK` + `HNVSD`)
//! - [`authentication`]: the two-phase signature (`HNSHK` ... `HNSHA`)
//! - [`challenge`]: TAN challenge decoders (photoTAN, HHD 1.3)
//!
//! For the PIN/TAN security method none of these perform real cryptography;
//! the envelope and signature are structural and carry plaintext credentials.

pub use fints_core::error;

pub mod constants;
pub mod auth_flow;
pub mod encryption;
pub mod authentication;
pub mod challenge;

pub use error::{ContractViolation, FintsError, FintsResult};
pub use auth_flow::{PendingSignature, SignatureState};
pub use encryption::{EncryptionMechanism, PinTanDummyEncryptionMechanism};
pub use authentication::{AuthenticationMechanism, Credentials, PinTanOneStepAuthenticationMechanism};
pub use challenge::{
    decode_phototan_image, parse_hhd_challenge, Challenge, ChallengeFormat, HhdChallenge, HhdCode, PhotoTanImage,
};
