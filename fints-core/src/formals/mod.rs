//! Formals carried by the FinTS security segments

pub mod codes;
pub mod security;
pub mod algorithms;

// Re-export types
pub use codes::{
    AlgorithmParameterIvName, AlgorithmParameterName, CompressionFunction, DateTimeType,
    EncryptionAlgorithmCoded, IdentifiedRole, KeyType, OperationMode, SecurityApplicationArea,
    SecurityMethod, SecurityRole, UsageEncryption,
};
pub use security::{
    BankIdentifier, KeyName, ReferenceMessage, SecurityDateTime, SecurityIdentificationDetails,
    SecurityProfile, UserDefinedSignature, COUNTRY_CODE_GERMANY,
};
pub use algorithms::{EncryptionAlgorithm, HashAlgorithm, SignatureAlgorithm};
