//! Two-phase signature flow
//!
//! A signature is produced in two steps around the business segments of a
//! message:
//!
//! 1. **Prepare**: the signature header is appended and remembered
//! 2. **Commit**: the trailer with the credentials is appended
//!
//! The state between the two steps is owned by one mechanism instance:
//!
//! ```text
//! Idle --prepare--> Prepared(pending) --commit--> Idle
//!                        |
//!                        +----abandon---> Idle
//! ```
//!
//! Every illegal transition is reported as a [`ContractViolation`].

use crate::error::{ContractViolation, FintsResult};
use fints_segment::Segment;

/// Signature prepared but not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignature {
    security_reference: String,
    header_segment: Segment,
}

impl PendingSignature {
    pub fn new(security_reference: impl Into<String>, header_segment: Segment) -> Self {
        Self {
            security_reference: security_reference.into(),
            header_segment,
        }
    }

    /// Reference correlating the header with its trailer
    pub fn security_reference(&self) -> &str {
        &self.security_reference
    }

    /// The signature header as it was appended to the message
    pub fn header_segment(&self) -> &Segment {
        &self.header_segment
    }
}

/// Signature state of one mechanism instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignatureState {
    /// No signature in progress
    #[default]
    Idle,
    /// Header appended, waiting for commit
    Prepared(PendingSignature),
}

impl SignatureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SignatureState::Idle)
    }

    /// Get the pending signature, if any
    pub fn pending(&self) -> Option<&PendingSignature> {
        match self {
            SignatureState::Idle => None,
            SignatureState::Prepared(pending) => Some(pending),
        }
    }

    /// Check that a new signature may be prepared
    pub fn ensure_idle(&self) -> FintsResult<()> {
        match self {
            SignatureState::Idle => Ok(()),
            SignatureState::Prepared(_) => Err(ContractViolation::SignatureAlreadyPending.into()),
        }
    }

    /// Get the pending signature a commit completes
    pub fn require_pending(&self) -> FintsResult<&PendingSignature> {
        self.pending()
            .ok_or_else(|| ContractViolation::NoPendingSignature.into())
    }

    /// Idle -> Prepared
    pub fn begin(&mut self, pending: PendingSignature) -> FintsResult<()> {
        self.ensure_idle()?;
        *self = SignatureState::Prepared(pending);
        Ok(())
    }

    /// Prepared -> Idle, returning the completed or discarded signature
    pub fn finish(&mut self) -> Option<PendingSignature> {
        match std::mem::take(self) {
            SignatureState::Idle => None,
            SignatureState::Prepared(pending) => Some(pending),
        }
    }
}
