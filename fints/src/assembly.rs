//! Secured message assembly
//!
//! Builds an outgoing message in the order the security mechanisms require:
//!
//! 1. message header (`HNHBK`)
//! 2. `sign_prepare` of every authentication mechanism (`HNSHK`)
//! 3. business segments
//! 4. `sign_commit` of every authentication mechanism, innermost first (`HNSHA`)
//! 5. message footer (`HNHBS`)
//! 6. `encrypt` of every encryption mechanism (`HNVSK` + `HNVSD`)
//! 7. message size
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use fints::{Credentials, DialogContext, SecuredMessageBuilder};
//! use fints::security::{PinTanDummyEncryptionMechanism, PinTanOneStepAuthenticationMechanism};
//! use std::sync::Arc;
//!
//! let mut encryption = PinTanDummyEncryptionMechanism::new();
//! let mut authentication = PinTanOneStepAuthenticationMechanism::new();
//!
//! let message = SecuredMessageBuilder::new(Arc::new(DialogContext::new("12345678", "user")))
//!     .encryption(&mut encryption)
//!     .authentication(&mut authentication)
//!     .build(&Credentials::new("1234"))?;
//! # Ok::<(), fints::FintsError>(())
//! ```

use fints_core::FintsResult;
use fints_security::{AuthenticationMechanism, Credentials, EncryptionMechanism};
use fints_segment::{DialogContext, Message, Segment};
use std::sync::Arc;

/// Builder for a signed and encrypted message
///
/// Mechanisms are borrowed, so their state (e.g. a pending signature) stays
/// with the caller between messages of a dialog.
pub struct SecuredMessageBuilder<'a> {
    context: Arc<DialogContext>,
    encryption: Vec<&'a mut dyn EncryptionMechanism>,
    authentication: Vec<&'a mut dyn AuthenticationMechanism>,
    segments: Vec<Segment>,
}

impl<'a> SecuredMessageBuilder<'a> {
    /// Create a builder for a message of the given dialog
    pub fn new(context: Arc<DialogContext>) -> Self {
        Self {
            context,
            encryption: Vec::new(),
            authentication: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Add an encryption mechanism
    pub fn encryption(mut self, mechanism: &'a mut dyn EncryptionMechanism) -> Self {
        self.encryption.push(mechanism);
        self
    }

    /// Add an authentication mechanism
    ///
    /// Signatures nest: the first mechanism added signs outermost.
    pub fn authentication(mut self, mechanism: &'a mut dyn AuthenticationMechanism) -> Self {
        self.authentication.push(mechanism);
        self
    }

    /// Add a business segment; its number is assigned during assembly
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Add several business segments
    pub fn segments(mut self, segments: impl IntoIterator<Item = Segment>) -> Self {
        self.segments.extend(segments);
        self
    }

    /// Assemble the message
    ///
    /// # Errors
    /// Any mechanism error is returned as is. Signatures prepared before the
    /// failure are abandoned so the mechanisms can be reused.
    pub fn build(mut self, credentials: &Credentials) -> FintsResult<Message> {
        let result = assemble(
            &self.context,
            &mut self.encryption,
            &mut self.authentication,
            std::mem::take(&mut self.segments),
            credentials,
        );
        if result.is_err() {
            for mechanism in self.authentication.iter_mut() {
                mechanism.abandon();
            }
        }
        result
    }

    /// Assemble the message and encode it with its final size
    pub fn encode(self, credentials: &Credentials) -> FintsResult<Vec<u8>> {
        self.build(credentials)?.encode()
    }
}

fn assemble(
    context: &Arc<DialogContext>,
    encryption: &mut [&mut dyn EncryptionMechanism],
    authentication: &mut [&mut dyn AuthenticationMechanism],
    segments: Vec<Segment>,
    credentials: &Credentials,
) -> FintsResult<Message> {
    let mut message = Message::new(Arc::clone(context))?;

    for mechanism in authentication.iter_mut() {
        mechanism.sign_prepare(&mut message)?;
    }
    for segment in segments {
        message.push(segment);
    }
    for mechanism in authentication.iter_mut().rev() {
        mechanism.sign_commit(&mut message, credentials)?;
    }
    message.close()?;

    for mechanism in encryption.iter_mut() {
        mechanism.encrypt(&mut message)?;
    }

    log::debug!(
        "Assembled message {} of dialog {}",
        context.message_number,
        context.dialog_id
    );
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fints_core::{ContractViolation, FintsError};
    use fints_security::{PinTanDummyEncryptionMechanism, PinTanOneStepAuthenticationMechanism};
    use fints_segment::{
        Element, EncryptionHeader, MessageFooter, MessageHeader, SignatureHeader, SignatureTrailer,
        TypedSegment,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context() -> Arc<DialogContext> {
        Arc::new(
            DialogContext::new("12345678", "user")
                .with_system_id("SYS1")
                .with_dialog_id("DLG?1")
                .with_message_number(2),
        )
    }

    fn business() -> Segment {
        Segment::decode(b"HKSAL:0:7+DE02120300000000202051::280:12345678+N'").unwrap()
    }

    fn auth() -> PinTanOneStepAuthenticationMechanism<StdRng> {
        PinTanOneStepAuthenticationMechanism::with_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_full_secured_message() {
        let mut encryption = PinTanDummyEncryptionMechanism::new();
        let mut authentication = auth();

        let mut message = SecuredMessageBuilder::new(context())
            .encryption(&mut encryption)
            .authentication(&mut authentication)
            .segment(business())
            .build(&Credentials::new("1234").with_tan("123456"))
            .unwrap();

        let types: Vec<&str> = message.segments().iter().map(Segment::type_id).collect();
        assert_eq!(types, vec!["HNHBK", "HNVSK", "HNVSD", "HNHBS"]);
        let numbers: Vec<u32> = message.segments().iter().map(Segment::number).collect();
        assert_eq!(numbers, vec![1, 998, 999, 5]);

        let inner = PinTanDummyEncryptionMechanism::interior_segments(&message).unwrap();
        let inner_types: Vec<&str> = inner.iter().map(Segment::type_id).collect();
        assert_eq!(inner_types, vec!["HNSHK", "HKSAL", "HNSHA"]);
        let inner_numbers: Vec<u32> = inner.iter().map(Segment::number).collect();
        assert_eq!(inner_numbers, vec![2, 3, 4]);

        let header = SignatureHeader::from_segment(&inner[0]).unwrap();
        let trailer = SignatureTrailer::from_segment(&inner[2]).unwrap();
        assert_eq!(header.security_reference, trailer.security_reference);
        assert_eq!(
            trailer.user_defined_signature.unwrap().tan.as_deref(),
            Some("123456")
        );

        let footer = MessageFooter::from_segment(&message.segments()[3]).unwrap();
        assert_eq!(footer.message_number, 2);
        assert!(authentication.state().is_idle());

        let bytes = message.encode().unwrap();
        assert_eq!(message.header().unwrap().message_size, bytes.len() as u64);
        let prefix = format!("HNHBK:1:3+{:012}+300+DLG??1+2'HNVSK:998:3+PIN:1+998+1+1::SYS1+1:", bytes.len());
        assert!(bytes.starts_with(prefix.as_bytes()));
        assert!(bytes.ends_with(b"HNHBS:5:1+2'"));
    }

    #[test]
    fn test_encoded_message_decodes_back() {
        let mut encryption = PinTanDummyEncryptionMechanism::new();
        let mut authentication = auth();
        let bytes = SecuredMessageBuilder::new(context())
            .encryption(&mut encryption)
            .authentication(&mut authentication)
            .segments([business(), business()])
            .encode(&Credentials::new("1234"))
            .unwrap();

        let decoded = Message::decode(context(), &bytes).unwrap();
        let header = decoded.header().unwrap();
        assert_eq!(header.message_size, bytes.len() as u64);
        assert_eq!(header.dialog_id, "DLG?1");
        assert!(EncryptionHeader::from_segment(&decoded.segments()[1]).is_ok());

        match decoded.segments()[2].element(0) {
            Element::Segments(inner) => assert_eq!(inner.len(), 4),
            other => panic!("unexpected element {:?}", other),
        }
        assert!(MessageHeader::matches(&decoded.segments()[0]));
    }

    #[test]
    fn test_nested_signatures_commit_innermost_first() {
        let mut outer = auth();
        let mut inner = PinTanOneStepAuthenticationMechanism::with_rng(StdRng::seed_from_u64(7));

        let message = SecuredMessageBuilder::new(context())
            .authentication(&mut outer)
            .authentication(&mut inner)
            .segment(business())
            .build(&Credentials::new("1234"))
            .unwrap();

        let segments = message.segments();
        let types: Vec<&str> = segments.iter().map(Segment::type_id).collect();
        assert_eq!(types, vec!["HNHBK", "HNSHK", "HNSHK", "HKSAL", "HNSHA", "HNSHA", "HNHBS"]);

        let outer_ref = SignatureHeader::from_segment(&segments[1]).unwrap().security_reference;
        let inner_ref = SignatureHeader::from_segment(&segments[2]).unwrap().security_reference;
        assert_eq!(SignatureTrailer::from_segment(&segments[4]).unwrap().security_reference, inner_ref);
        assert_eq!(SignatureTrailer::from_segment(&segments[5]).unwrap().security_reference, outer_ref);
    }

    #[test]
    fn test_failed_assembly_abandons_signature() {
        let mut authentication = auth();
        let result = SecuredMessageBuilder::new(context())
            .authentication(&mut authentication)
            .build(&Credentials::new("9".repeat(100)));
        assert!(matches!(result, Err(FintsError::InvalidData(_))));
        assert!(authentication.state().is_idle());

        // The mechanism is reusable afterwards.
        let mut message = Message::new(context()).unwrap();
        authentication.sign_prepare(&mut message).unwrap();
        assert_eq!(
            authentication.sign_prepare(&mut message).unwrap_err(),
            FintsError::Contract(ContractViolation::SignatureAlreadyPending)
        );
    }

    #[test]
    fn test_signature_profile_ignores_encryption_version() {
        let mut encryption = PinTanDummyEncryptionMechanism::new().with_security_method_version(2);
        let mut authentication = auth();
        let message = SecuredMessageBuilder::new(context())
            .encryption(&mut encryption)
            .authentication(&mut authentication)
            .segment(business())
            .build(&Credentials::new("1234"))
            .unwrap();

        let envelope = EncryptionHeader::from_segment(&message.segments()[1]).unwrap();
        assert_eq!(envelope.security_profile.security_method_version, 2);

        let inner = PinTanDummyEncryptionMechanism::interior_segments(&message).unwrap();
        let header = SignatureHeader::from_segment(&inner[0]).unwrap();
        assert_eq!(header.security_profile.security_method_version, 1);
    }

    #[test]
    fn test_plain_message_without_mechanisms() {
        let bytes = SecuredMessageBuilder::new(context())
            .segment(business())
            .encode(&Credentials::new("1234"))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("'HKSAL:2:7+"));
        assert!(text.ends_with("'HNHBS:3:1+2'"));
    }
}
