//! Algorithm descriptors negotiated in the security headers
//!
//! For PIN/TAN these are placeholders: the values are fixed by the scheme and
//! no cryptographic operation is performed with them.

use crate::formals::codes::{
    AlgorithmParameterIvName, AlgorithmParameterName, EncryptionAlgorithmCoded, OperationMode,
    UsageEncryption,
};
use serde::{Deserialize, Serialize};

/// Encryption algorithm descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionAlgorithm {
    pub usage_encryption: UsageEncryption,
    pub operation_mode: OperationMode,
    pub encryption_algorithm: EncryptionAlgorithmCoded,
    pub algorithm_parameter_value: Vec<u8>,
    pub algorithm_parameter_name: AlgorithmParameterName,
    pub algorithm_parameter_iv_name: AlgorithmParameterIvName,
    pub algorithm_parameter_iv_value: Option<Vec<u8>>,
}

impl EncryptionAlgorithm {
    /// Descriptor used by PIN/TAN: two-key 3DES in CBC mode with an all-zero key
    pub fn pin_tan() -> Self {
        Self {
            usage_encryption: UsageEncryption::Osy,
            operation_mode: OperationMode::Cbc,
            encryption_algorithm: EncryptionAlgorithmCoded::TwoKey3Des,
            algorithm_parameter_value: vec![0u8; 8],
            algorithm_parameter_name: AlgorithmParameterName::Kye,
            algorithm_parameter_iv_name: AlgorithmParameterIvName::Ivc,
            algorithm_parameter_iv_value: None,
        }
    }
}

/// Hash algorithm descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashAlgorithm {
    pub usage_hash: String,
    pub hash_algorithm: String,
    pub algorithm_parameter_name: String,
    pub algorithm_parameter_value: Option<Vec<u8>>,
}

impl HashAlgorithm {
    /// Negotiate the hash algorithm (`999`), as PIN/TAN requires
    pub fn negotiate() -> Self {
        Self {
            usage_hash: "1".to_string(),
            hash_algorithm: "999".to_string(),
            algorithm_parameter_name: "1".to_string(),
            algorithm_parameter_value: None,
        }
    }
}

/// Signature algorithm descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAlgorithm {
    pub usage_signature: String,
    pub signature_algorithm: String,
    pub operation_mode: String,
}

impl SignatureAlgorithm {
    /// RSA with ISO 9796-1, the placeholder PIN/TAN declares
    pub fn rsa_iso9796_1() -> Self {
        Self {
            usage_signature: "6".to_string(),
            signature_algorithm: "10".to_string(),
            operation_mode: OperationMode::Iso9796_1.code().to_string(),
        }
    }
}
