//! Encryption functionality for FinTS
//!
//! The encryption envelope replaces the interior of a message (everything
//! between header and footer) by an encryption header (`HNVSK`) and an
//! encrypted data container (`HNVSD`) holding the interior segments.

use crate::constants::{
    DEFAULT_SECURITY_METHOD_VERSION, ENCRYPTED_DATA_NUMBER, ENCRYPTION_HEADER_NUMBER,
    SECURITY_FUNCTION_ENCRYPTION,
};
use crate::error::{ContractViolation, FintsError, FintsResult};
use fints_core::formals::{
    CompressionFunction, EncryptionAlgorithm, KeyName, KeyType, SecurityDateTime,
    SecurityIdentificationDetails, SecurityMethod, SecurityProfile, SecurityRole,
};
use fints_segment::{
    DialogContext, EncryptedData, EncryptionHeader, Message, MessageFooter, MessageHeader, Segment,
    TypedSegment,
};

/// Encryption mechanism of a security method
pub trait EncryptionMechanism {
    /// Wrap the interior of an outgoing message
    fn encrypt(&mut self, message: &mut Message) -> FintsResult<()>;

    /// Unwrap an inbound message
    fn decrypt(&mut self, message: &mut Message) -> FintsResult<()>;
}

/// PIN/TAN "encryption": a structural envelope around plaintext segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTanDummyEncryptionMechanism {
    security_method_version: u32,
}

impl Default for PinTanDummyEncryptionMechanism {
    fn default() -> Self {
        Self::new()
    }
}

impl PinTanDummyEncryptionMechanism {
    pub fn new() -> Self {
        Self {
            security_method_version: DEFAULT_SECURITY_METHOD_VERSION,
        }
    }

    /// Set the PIN/TAN security method version written into the envelope
    pub fn with_security_method_version(mut self, version: u32) -> Self {
        self.security_method_version = version;
        self
    }

    pub fn security_method_version(&self) -> u32 {
        self.security_method_version
    }

    fn encryption_header(&self, context: &DialogContext) -> EncryptionHeader {
        EncryptionHeader {
            security_profile: SecurityProfile::new(SecurityMethod::Pin, self.security_method_version),
            security_function: SECURITY_FUNCTION_ENCRYPTION.to_string(),
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender(
                context.system_id.as_str(),
            ),
            security_datetime: SecurityDateTime::now(),
            encryption_algorithm: EncryptionAlgorithm::pin_tan(),
            key_name: KeyName::new(
                context.bank_identifier.clone(),
                context.user_id.as_str(),
                KeyType::V,
            ),
            compression_function: CompressionFunction::Null,
        }
    }

    /// Get the segments held by the encrypted data container
    ///
    /// # Errors
    /// Returns invalid data if the message carries no `HNVSD`.
    pub fn interior_segments(message: &Message) -> FintsResult<Vec<Segment>> {
        let container = message
            .segments()
            .iter()
            .find(|s| EncryptedData::matches(s))
            .ok_or_else(|| FintsError::InvalidData("message has no encrypted data".to_string()))?;
        container.nested_segments(0)
    }
}

/// Check that the message is bounded by header and footer
fn check_bounds(segments: &[Segment]) -> FintsResult<()> {
    match segments.first() {
        Some(first) if MessageHeader::matches(first) => {}
        other => {
            return Err(ContractViolation::MissingHeader {
                found: describe(other),
            }
            .into());
        }
    }
    match segments.last() {
        Some(last) if segments.len() > 1 && MessageFooter::matches(last) => Ok(()),
        other => Err(ContractViolation::MissingFooter {
            found: describe(other),
        }
        .into()),
    }
}

fn describe(segment: Option<&Segment>) -> String {
    segment.map_or_else(|| "nothing".to_string(), |s| s.type_id().to_string())
}

impl EncryptionMechanism for PinTanDummyEncryptionMechanism {
    fn encrypt(&mut self, message: &mut Message) -> FintsResult<()> {
        check_bounds(message.segments())?;

        let segments = message.segments();
        let interior = segments[1..segments.len() - 1].to_vec();
        let count = interior.len();
        let header = self
            .encryption_header(message.context())
            .to_segment(ENCRYPTION_HEADER_NUMBER)?;
        let container = EncryptedData { data: interior }.to_segment(ENCRYPTED_DATA_NUMBER)?;

        let segments = message.segments_mut();
        let end = segments.len() - 1;
        segments.splice(1..end, [header, container]);

        log::debug!("Wrapped {} segments into the PIN/TAN envelope", count);
        Ok(())
    }

    fn decrypt(&mut self, _message: &mut Message) -> FintsResult<()> {
        // The PIN/TAN payload is plaintext.
        Ok(())
    }
}
