use thiserror::Error;

/// Main error type for FinTS operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FintsError {
    /// A caller broke an API contract. These are programming errors and must
    /// not be retried.
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("Challenge truncated: {field} needs {expected} bytes, only {available} available")]
    ChallengeTruncated {
        field: &'static str,
        expected: usize,
        available: usize,
    },

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Security error: {0}")]
    Security(String),
}

/// Misuse of the message or mechanism API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("message must start with HNHBK, found {found}")]
    MissingHeader { found: String },

    #[error("message must end with HNHBS, found {found}")]
    MissingFooter { found: String },

    #[error("no signature is pending")]
    NoPendingSignature,

    #[error("cannot sign a message that was not prepared")]
    SignatureNotInMessage,

    #[error("a signature is already pending on this mechanism")]
    SignatureAlreadyPending,
}

impl FintsError {
    /// Check whether this error reports a programming error rather than bad input
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, FintsError::Contract(_))
    }
}

/// Result type alias for FinTS operations
pub type FintsResult<T> = Result<T, FintsError>;
