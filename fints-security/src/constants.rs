//! FinTS security constants
//!
//! Fixed values of the PIN/TAN security profile as defined by the FinTS
//! "Sicherheitsverfahren HBCI" and "Sicherheitsverfahren PIN/TAN" documents.

/// Sequence number of the encryption header (`HNVSK`)
///
/// Envelope segments do not take part in the regular numbering.
pub const ENCRYPTION_HEADER_NUMBER: u32 = 998;

/// Sequence number of the encrypted data container (`HNVSD`)
pub const ENCRYPTED_DATA_NUMBER: u32 = 999;

/// Security function of the encryption header
pub const SECURITY_FUNCTION_ENCRYPTION: &str = "998";

/// Security function of a one-step PIN/TAN signature
pub const SECURITY_FUNCTION_ONE_STEP: &str = "999";

/// Default PIN/TAN security method version of the encryption header
pub const DEFAULT_SECURITY_METHOD_VERSION: u32 = 1;

/// PIN/TAN security method version of the signature header
pub const SIGNATURE_SECURITY_METHOD_VERSION: u32 = 1;

/// Smallest security reference drawn by `sign_prepare`
pub const SECURITY_REFERENCE_MIN: u32 = 1_000_000;

/// Largest security reference drawn by `sign_prepare`
pub const SECURITY_REFERENCE_MAX: u32 = 9_999_999;

/// Security reference number of the signature header
///
/// Fixed; whether banks expect a per-dialog counter here is not settled.
pub const SECURITY_REFERENCE_NUMBER: u64 = 1;
