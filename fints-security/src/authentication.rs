//! Authentication functionality for FinTS
//!
//! PIN/TAN signs a message by framing its business segments with a
//! signature header (`HNSHK`) and a signature trailer (`HNSHA`) that carries
//! the PIN and, for transactions, the TAN. See [`crate::auth_flow`] for the
//! prepare/commit state machine.

use crate::auth_flow::{PendingSignature, SignatureState};
use crate::constants::{
    SECURITY_FUNCTION_ONE_STEP, SECURITY_REFERENCE_MAX, SECURITY_REFERENCE_MIN,
    SECURITY_REFERENCE_NUMBER, SIGNATURE_SECURITY_METHOD_VERSION,
};
use crate::error::{ContractViolation, FintsResult};
use fints_core::formals::{
    HashAlgorithm, KeyName, KeyType, SecurityApplicationArea, SecurityDateTime,
    SecurityIdentificationDetails, SecurityMethod, SecurityProfile, SecurityRole, SignatureAlgorithm,
    UserDefinedSignature,
};
use fints_segment::{DialogContext, Message, SignatureHeader, SignatureTrailer, TypedSegment};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Authentication mechanism of a security method
pub trait AuthenticationMechanism {
    /// Append the signature header and remember it as pending
    fn sign_prepare(&mut self, message: &mut Message) -> FintsResult<()>;

    /// Append the signature trailer for the pending signature
    fn sign_commit(&mut self, message: &mut Message, credentials: &Credentials) -> FintsResult<()>;

    /// Verify the signature of an inbound message
    fn verify(&self, message: &Message) -> FintsResult<bool>;

    /// Discard the pending signature without committing it
    ///
    /// The header already appended to a message stays there; the caller is
    /// expected to drop that message.
    fn abandon(&mut self) -> Option<PendingSignature>;
}

/// PIN and optional TAN, wiped from memory when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pin: String,
    tan: Option<String>,
}

impl Credentials {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            tan: None,
        }
    }

    /// Add the TAN for a transaction
    pub fn with_tan(mut self, tan: impl Into<String>) -> Self {
        self.tan = Some(tan.into());
        self
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn tan(&self) -> Option<&str> {
        self.tan.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("pin", &"***")
            .field("tan", &self.tan.as_ref().map(|_| "***"))
            .finish()
    }
}

/// One-step PIN/TAN signature
///
/// The random source for the security reference is injected; [`OsRng`] is
/// used unless another cryptographically secure generator is supplied.
#[derive(Debug)]
pub struct PinTanOneStepAuthenticationMechanism<R = OsRng> {
    rng: R,
    state: SignatureState,
}

impl PinTanOneStepAuthenticationMechanism<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for PinTanOneStepAuthenticationMechanism<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> PinTanOneStepAuthenticationMechanism<R> {
    /// Create a mechanism drawing security references from `rng`
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            state: SignatureState::Idle,
        }
    }

    pub fn state(&self) -> &SignatureState {
        &self.state
    }

    fn next_security_reference(&mut self) -> u32 {
        self.rng.gen_range(SECURITY_REFERENCE_MIN..=SECURITY_REFERENCE_MAX)
    }

    fn signature_header(&self, context: &DialogContext, security_reference: &str) -> SignatureHeader {
        SignatureHeader {
            security_profile: SecurityProfile::new(
                SecurityMethod::Pin,
                SIGNATURE_SECURITY_METHOD_VERSION,
            ),
            security_function: SECURITY_FUNCTION_ONE_STEP.to_string(),
            security_reference: security_reference.to_string(),
            security_application_area: SecurityApplicationArea::Shm,
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender(
                context.system_id.as_str(),
            ),
            security_reference_number: SECURITY_REFERENCE_NUMBER,
            security_datetime: SecurityDateTime::now(),
            hash_algorithm: HashAlgorithm::negotiate(),
            signature_algorithm: SignatureAlgorithm::rsa_iso9796_1(),
            key_name: KeyName::new(
                context.bank_identifier.clone(),
                context.user_id.as_str(),
                KeyType::S,
            ),
        }
    }
}

impl<R: RngCore + CryptoRng> AuthenticationMechanism for PinTanOneStepAuthenticationMechanism<R> {
    fn sign_prepare(&mut self, message: &mut Message) -> FintsResult<()> {
        self.state.ensure_idle()?;

        let security_reference = self.next_security_reference().to_string();
        let mut segment = self
            .signature_header(message.context(), &security_reference)
            .to_segment(0)?;
        let number = message.push(segment.clone());
        segment.set_number(number);

        log::debug!("Prepared signature {} as segment {}", security_reference, number);
        self.state.begin(PendingSignature::new(security_reference, segment))
    }

    fn sign_commit(&mut self, message: &mut Message, credentials: &Credentials) -> FintsResult<()> {
        let pending = self.state.require_pending()?;
        if !message.contains(pending.header_segment()) {
            return Err(ContractViolation::SignatureNotInMessage.into());
        }

        let mut trailer = SignatureTrailer {
            security_reference: pending.security_reference().to_string(),
            validation_result: None,
            user_defined_signature: Some(UserDefinedSignature {
                pin: credentials.pin().to_string(),
                tan: credentials.tan().map(str::to_string),
            }),
        };
        let segment = trailer.to_segment(0);
        if let Some(signature) = trailer.user_defined_signature.as_mut() {
            signature.pin.zeroize();
            signature.tan.zeroize();
        }
        let number = message.push(segment?);

        if let Some(done) = self.state.finish() {
            log::debug!("Committed signature {} as segment {}", done.security_reference(), number);
        }
        Ok(())
    }

    fn verify(&self, _message: &Message) -> FintsResult<bool> {
        // A PIN/TAN client trusts the transport channel.
        Ok(true)
    }

    fn abandon(&mut self) -> Option<PendingSignature> {
        let pending = self.state.finish();
        if let Some(pending) = &pending {
            log::warn!("Abandoned signature {}", pending.security_reference());
        }
        pending
    }
}
