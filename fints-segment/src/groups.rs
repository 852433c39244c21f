//! Data element group schemas for the security formals
//!
//! Each formal from `fints_core::formals` gets a field list and a conversion
//! to and from [`NamedFields`], so typed segments can embed it as a record.

use crate::error::FintsResult;
use crate::schema::{FieldDef, FieldType, FieldValue, NamedFields, IDENTIFIER_MAX_LENGTH};
use fints_core::formals::*;

/// A formal that is carried as a data element group
pub trait GroupRecord: Sized {
    /// Fields of the group, in wire order
    const FIELDS: &'static [FieldDef];

    /// Describe the group by field name
    fn to_record(&self) -> NamedFields;

    /// Rebuild the group from a decoded record
    fn from_record(record: &NamedFields) -> FintsResult<Self>;

    /// Wrap the group as a field value
    fn to_value(&self) -> FieldValue {
        FieldValue::Record(self.to_record())
    }

    /// Rebuild the group from a field value
    fn from_value(value: &FieldValue) -> FintsResult<Self> {
        Self::from_record(value.as_record()?)
    }
}

const fn code(max_length: usize, codes: &'static [&'static str]) -> FieldType {
    FieldType::Code { max_length, codes }
}

const fn any_code(max_length: usize) -> FieldType {
    FieldType::Code { max_length, codes: &[] }
}

const fn binary(max_length: usize) -> FieldType {
    FieldType::Binary { max_length: Some(max_length) }
}

pub const SECURITY_PROFILE: &[FieldDef] = &[
    FieldDef::required("security_method", code(3, SecurityMethod::CODES)),
    FieldDef::required("security_method_version", FieldType::Numeric { max_length: 3 }),
];

pub const BANK_IDENTIFIER: &[FieldDef] = &[
    FieldDef::required("country_identifier", FieldType::Alphanumeric { max_length: 3 }),
    FieldDef::required("bank_code", FieldType::Alphanumeric { max_length: IDENTIFIER_MAX_LENGTH }),
];

pub const SECURITY_IDENTIFICATION_DETAILS: &[FieldDef] = &[
    FieldDef::required("identified_role", code(3, IdentifiedRole::CODES)),
    FieldDef::optional("cid", binary(256)),
    FieldDef::optional("identifier", FieldType::Identifier),
];

pub const SECURITY_DATE_TIME: &[FieldDef] = &[
    FieldDef::required("date_time_type", code(3, DateTimeType::CODES)),
    FieldDef::optional("date", FieldType::Date),
    FieldDef::optional("time", FieldType::Time),
];

pub const ENCRYPTION_ALGORITHM: &[FieldDef] = &[
    FieldDef::required("usage_encryption", code(3, UsageEncryption::CODES)),
    FieldDef::required("operation_mode", code(3, OperationMode::CODES)),
    FieldDef::required("encryption_algorithm", code(3, EncryptionAlgorithmCoded::CODES)),
    FieldDef::required("algorithm_parameter_value", binary(512)),
    FieldDef::required("algorithm_parameter_name", code(3, AlgorithmParameterName::CODES)),
    FieldDef::required("algorithm_parameter_iv_name", code(3, AlgorithmParameterIvName::CODES)),
    FieldDef::optional("algorithm_parameter_iv_value", binary(512)),
];

pub const KEY_NAME: &[FieldDef] = &[
    FieldDef::required("bank_identifier", FieldType::Group(BANK_IDENTIFIER)),
    FieldDef::required("user_id", FieldType::Identifier),
    FieldDef::required("key_type", code(1, KeyType::CODES)),
    FieldDef::required("key_number", FieldType::Numeric { max_length: 3 }),
    FieldDef::required("key_version", FieldType::Numeric { max_length: 3 }),
];

pub const HASH_ALGORITHM: &[FieldDef] = &[
    FieldDef::required("usage_hash", any_code(3)),
    FieldDef::required("hash_algorithm", any_code(3)),
    FieldDef::required("algorithm_parameter_name", any_code(3)),
    FieldDef::optional("algorithm_parameter_value", binary(512)),
];

pub const SIGNATURE_ALGORITHM: &[FieldDef] = &[
    FieldDef::required("usage_signature", any_code(3)),
    FieldDef::required("signature_algorithm", any_code(3)),
    FieldDef::required("operation_mode", any_code(3)),
];

pub const USER_DEFINED_SIGNATURE: &[FieldDef] = &[
    FieldDef::required("pin", FieldType::Alphanumeric { max_length: 99 }),
    FieldDef::optional("tan", FieldType::Alphanumeric { max_length: 99 }),
];

pub const REFERENCE_MESSAGE: &[FieldDef] = &[
    FieldDef::required("dialog_id", FieldType::Identifier),
    FieldDef::required("message_number", FieldType::Numeric { max_length: 4 }),
];

/// Certificate group; declared by the security headers, never filled for PIN/TAN
pub const CERTIFICATE: &[FieldDef] = &[
    FieldDef::required("certificate_type", any_code(3)),
    FieldDef::required("certificate_content", binary(4096)),
];

fn opt_text(record: &NamedFields, name: &str) -> FintsResult<Option<String>> {
    record
        .optional(name)
        .map(|v| v.as_text().map(str::to_string))
        .transpose()
}

fn opt_binary(record: &NamedFields, name: &str) -> FintsResult<Option<Vec<u8>>> {
    record
        .optional(name)
        .map(|v| v.as_binary().map(<[u8]>::to_vec))
        .transpose()
}

fn text(record: &NamedFields, name: &str) -> FintsResult<String> {
    Ok(record.require(name)?.as_text()?.to_string())
}

impl GroupRecord for SecurityProfile {
    const FIELDS: &'static [FieldDef] = SECURITY_PROFILE;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("security_method", self.security_method.code())
            .with("security_method_version", self.security_method_version)
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            security_method: SecurityMethod::from_code(record.require("security_method")?.as_text()?)?,
            security_method_version: record.require("security_method_version")?.as_u32()?,
        })
    }
}

impl GroupRecord for BankIdentifier {
    const FIELDS: &'static [FieldDef] = BANK_IDENTIFIER;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("country_identifier", self.country_identifier.as_str())
            .with("bank_code", self.bank_code.as_str())
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            country_identifier: text(record, "country_identifier")?,
            bank_code: text(record, "bank_code")?,
        })
    }
}

impl GroupRecord for SecurityIdentificationDetails {
    const FIELDS: &'static [FieldDef] = SECURITY_IDENTIFICATION_DETAILS;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("identified_role", self.identified_role.code())
            .with("cid", FieldValue::optional(self.cid.clone()))
            .with("identifier", self.identifier.as_str())
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            identified_role: IdentifiedRole::from_code(record.require("identified_role")?.as_text()?)?,
            cid: opt_binary(record, "cid")?,
            identifier: opt_text(record, "identifier")?.unwrap_or_default(),
        })
    }
}

impl GroupRecord for SecurityDateTime {
    const FIELDS: &'static [FieldDef] = SECURITY_DATE_TIME;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("date_time_type", self.date_time_type.code())
            .with("date", FieldValue::Date(self.date))
            .with("time", FieldValue::Time(self.time))
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            date_time_type: DateTimeType::from_code(record.require("date_time_type")?.as_text()?)?,
            date: record.require("date")?.as_date()?,
            time: record.require("time")?.as_time()?,
        })
    }
}

impl GroupRecord for EncryptionAlgorithm {
    const FIELDS: &'static [FieldDef] = ENCRYPTION_ALGORITHM;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("usage_encryption", self.usage_encryption.code())
            .with("operation_mode", self.operation_mode.code())
            .with("encryption_algorithm", self.encryption_algorithm.code())
            .with("algorithm_parameter_value", self.algorithm_parameter_value.clone())
            .with("algorithm_parameter_name", self.algorithm_parameter_name.code())
            .with("algorithm_parameter_iv_name", self.algorithm_parameter_iv_name.code())
            .with(
                "algorithm_parameter_iv_value",
                FieldValue::optional(self.algorithm_parameter_iv_value.clone()),
            )
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            usage_encryption: UsageEncryption::from_code(record.require("usage_encryption")?.as_text()?)?,
            operation_mode: OperationMode::from_code(record.require("operation_mode")?.as_text()?)?,
            encryption_algorithm: EncryptionAlgorithmCoded::from_code(
                record.require("encryption_algorithm")?.as_text()?,
            )?,
            algorithm_parameter_value: record.require("algorithm_parameter_value")?.as_binary()?.to_vec(),
            algorithm_parameter_name: AlgorithmParameterName::from_code(
                record.require("algorithm_parameter_name")?.as_text()?,
            )?,
            algorithm_parameter_iv_name: AlgorithmParameterIvName::from_code(
                record.require("algorithm_parameter_iv_name")?.as_text()?,
            )?,
            algorithm_parameter_iv_value: opt_binary(record, "algorithm_parameter_iv_value")?,
        })
    }
}

impl GroupRecord for KeyName {
    const FIELDS: &'static [FieldDef] = KEY_NAME;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("bank_identifier", self.bank_identifier.to_value())
            .with("user_id", self.user_id.as_str())
            .with("key_type", self.key_type.code())
            .with("key_number", self.key_number)
            .with("key_version", self.key_version)
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            bank_identifier: BankIdentifier::from_value(record.require("bank_identifier")?)?,
            user_id: text(record, "user_id")?,
            key_type: KeyType::from_code(record.require("key_type")?.as_text()?)?,
            key_number: record.require("key_number")?.as_u32()?,
            key_version: record.require("key_version")?.as_u32()?,
        })
    }
}

impl GroupRecord for HashAlgorithm {
    const FIELDS: &'static [FieldDef] = HASH_ALGORITHM;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("usage_hash", self.usage_hash.as_str())
            .with("hash_algorithm", self.hash_algorithm.as_str())
            .with("algorithm_parameter_name", self.algorithm_parameter_name.as_str())
            .with(
                "algorithm_parameter_value",
                FieldValue::optional(self.algorithm_parameter_value.clone()),
            )
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            usage_hash: text(record, "usage_hash")?,
            hash_algorithm: text(record, "hash_algorithm")?,
            algorithm_parameter_name: text(record, "algorithm_parameter_name")?,
            algorithm_parameter_value: opt_binary(record, "algorithm_parameter_value")?,
        })
    }
}

impl GroupRecord for SignatureAlgorithm {
    const FIELDS: &'static [FieldDef] = SIGNATURE_ALGORITHM;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("usage_signature", self.usage_signature.as_str())
            .with("signature_algorithm", self.signature_algorithm.as_str())
            .with("operation_mode", self.operation_mode.as_str())
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            usage_signature: text(record, "usage_signature")?,
            signature_algorithm: text(record, "signature_algorithm")?,
            operation_mode: text(record, "operation_mode")?,
        })
    }
}

impl GroupRecord for UserDefinedSignature {
    const FIELDS: &'static [FieldDef] = USER_DEFINED_SIGNATURE;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("pin", self.pin.as_str())
            .with("tan", FieldValue::optional(self.tan.clone()))
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            pin: text(record, "pin")?,
            tan: opt_text(record, "tan")?,
        })
    }
}

impl GroupRecord for ReferenceMessage {
    const FIELDS: &'static [FieldDef] = REFERENCE_MESSAGE;

    fn to_record(&self) -> NamedFields {
        NamedFields::new()
            .with("dialog_id", self.dialog_id.as_str())
            .with("message_number", self.message_number)
    }

    fn from_record(record: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            dialog_id: text(record, "dialog_id")?,
            message_number: record.require("message_number")?.as_u32()?,
        })
    }
}
