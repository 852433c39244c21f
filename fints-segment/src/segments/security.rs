//! Security envelope segments
//!
//! - `HNVSK` (Verschlüsselungskopf): encryption header
//! - `HNVSD` (Verschlüsselte Daten): encrypted data container
//! - `HNSHK` (Signaturkopf): signature header
//! - `HNSHA` (Signaturabschluss): signature trailer
//!
//! For PIN/TAN none of these carry real cryptographic material: the
//! encrypted data is plaintext and the signature is the PIN and TAN.

use super::TypedSegment;
use crate::error::FintsResult;
use crate::groups::{GroupRecord, CERTIFICATE};
use crate::schema::{FieldDef, FieldType, FieldValue, NamedFields, SegmentSchema};
use crate::segment::Segment;
use fints_core::formals::*;

/// Verschlüsselungskopf, version 3
pub const HNVSK3: SegmentSchema = SegmentSchema {
    type_id: "HNVSK",
    version: 3,
    fields: &[
        FieldDef::required("security_profile", FieldType::Group(SecurityProfile::FIELDS)),
        FieldDef::required("security_function", FieldType::Code { max_length: 3, codes: &[] }),
        FieldDef::required(
            "security_role",
            FieldType::Code { max_length: 3, codes: SecurityRole::CODES },
        ),
        FieldDef::required(
            "security_identification_details",
            FieldType::Group(SecurityIdentificationDetails::FIELDS),
        ),
        FieldDef::required("security_datetime", FieldType::Group(SecurityDateTime::FIELDS)),
        FieldDef::required("encryption_algorithm", FieldType::Group(EncryptionAlgorithm::FIELDS)),
        FieldDef::required("key_name", FieldType::Group(KeyName::FIELDS)),
        FieldDef::required(
            "compression_function",
            FieldType::Code { max_length: 3, codes: CompressionFunction::CODES },
        ),
        FieldDef::optional("certificate", FieldType::Group(CERTIFICATE)),
    ],
};

/// Verschlüsselte Daten, version 1
pub const HNVSD1: SegmentSchema = SegmentSchema {
    type_id: "HNVSD",
    version: 1,
    fields: &[FieldDef::required("data", FieldType::SegmentSequence)],
};

/// Signaturkopf, version 4
pub const HNSHK4: SegmentSchema = SegmentSchema {
    type_id: "HNSHK",
    version: 4,
    fields: &[
        FieldDef::required("security_profile", FieldType::Group(SecurityProfile::FIELDS)),
        FieldDef::required("security_function", FieldType::Code { max_length: 3, codes: &[] }),
        FieldDef::required("security_reference", FieldType::Alphanumeric { max_length: 14 }),
        FieldDef::required(
            "security_application_area",
            FieldType::Code { max_length: 3, codes: SecurityApplicationArea::CODES },
        ),
        FieldDef::required(
            "security_role",
            FieldType::Code { max_length: 3, codes: SecurityRole::CODES },
        ),
        FieldDef::required(
            "security_identification_details",
            FieldType::Group(SecurityIdentificationDetails::FIELDS),
        ),
        FieldDef::required("security_reference_number", FieldType::Numeric { max_length: 16 }),
        FieldDef::required("security_datetime", FieldType::Group(SecurityDateTime::FIELDS)),
        FieldDef::required("hash_algorithm", FieldType::Group(HashAlgorithm::FIELDS)),
        FieldDef::required("signature_algorithm", FieldType::Group(SignatureAlgorithm::FIELDS)),
        FieldDef::required("key_name", FieldType::Group(KeyName::FIELDS)),
        FieldDef::optional("certificate", FieldType::Group(CERTIFICATE)),
    ],
};

/// Signaturabschluss, version 2
pub const HNSHA2: SegmentSchema = SegmentSchema {
    type_id: "HNSHA",
    version: 2,
    fields: &[
        FieldDef::required("security_reference", FieldType::Alphanumeric { max_length: 14 }),
        FieldDef::optional("validation_result", FieldType::Binary { max_length: Some(512) }),
        FieldDef::optional("user_defined_signature", FieldType::Group(UserDefinedSignature::FIELDS)),
    ],
};

/// Encryption header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionHeader {
    pub security_profile: SecurityProfile,
    pub security_function: String,
    pub security_role: SecurityRole,
    pub security_identification_details: SecurityIdentificationDetails,
    pub security_datetime: SecurityDateTime,
    pub encryption_algorithm: EncryptionAlgorithm,
    pub key_name: KeyName,
    pub compression_function: CompressionFunction,
}

impl TypedSegment for EncryptionHeader {
    const SCHEMA: &'static SegmentSchema = &HNVSK3;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new()
            .with("security_profile", self.security_profile.to_value())
            .with("security_function", self.security_function.as_str())
            .with("security_role", self.security_role.code())
            .with(
                "security_identification_details",
                self.security_identification_details.to_value(),
            )
            .with("security_datetime", self.security_datetime.to_value())
            .with("encryption_algorithm", self.encryption_algorithm.to_value())
            .with("key_name", self.key_name.to_value())
            .with("compression_function", self.compression_function.code())
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            security_profile: SecurityProfile::from_value(fields.require("security_profile")?)?,
            security_function: fields.require("security_function")?.as_text()?.to_string(),
            security_role: SecurityRole::from_code(fields.require("security_role")?.as_text()?)?,
            security_identification_details: SecurityIdentificationDetails::from_value(
                fields.require("security_identification_details")?,
            )?,
            security_datetime: SecurityDateTime::from_value(fields.require("security_datetime")?)?,
            encryption_algorithm: EncryptionAlgorithm::from_value(fields.require("encryption_algorithm")?)?,
            key_name: KeyName::from_value(fields.require("key_name")?)?,
            compression_function: CompressionFunction::from_code(
                fields.require("compression_function")?.as_text()?,
            )?,
        })
    }
}

/// Encrypted data container holding the wrapped segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    pub data: Vec<Segment>,
}

impl TypedSegment for EncryptedData {
    const SCHEMA: &'static SegmentSchema = &HNVSD1;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new().with("data", FieldValue::Segments(self.data.clone()))
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            data: fields
                .optional("data")
                .map(|v| v.as_segments().map(<[Segment]>::to_vec))
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub security_profile: SecurityProfile,
    pub security_function: String,
    pub security_reference: String,
    pub security_application_area: SecurityApplicationArea,
    pub security_role: SecurityRole,
    pub security_identification_details: SecurityIdentificationDetails,
    pub security_reference_number: u64,
    pub security_datetime: SecurityDateTime,
    pub hash_algorithm: HashAlgorithm,
    pub signature_algorithm: SignatureAlgorithm,
    pub key_name: KeyName,
}

impl TypedSegment for SignatureHeader {
    const SCHEMA: &'static SegmentSchema = &HNSHK4;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new()
            .with("security_profile", self.security_profile.to_value())
            .with("security_function", self.security_function.as_str())
            .with("security_reference", self.security_reference.as_str())
            .with("security_application_area", self.security_application_area.code())
            .with("security_role", self.security_role.code())
            .with(
                "security_identification_details",
                self.security_identification_details.to_value(),
            )
            .with("security_reference_number", self.security_reference_number)
            .with("security_datetime", self.security_datetime.to_value())
            .with("hash_algorithm", self.hash_algorithm.to_value())
            .with("signature_algorithm", self.signature_algorithm.to_value())
            .with("key_name", self.key_name.to_value())
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            security_profile: SecurityProfile::from_value(fields.require("security_profile")?)?,
            security_function: fields.require("security_function")?.as_text()?.to_string(),
            security_reference: fields.require("security_reference")?.as_text()?.to_string(),
            security_application_area: SecurityApplicationArea::from_code(
                fields.require("security_application_area")?.as_text()?,
            )?,
            security_role: SecurityRole::from_code(fields.require("security_role")?.as_text()?)?,
            security_identification_details: SecurityIdentificationDetails::from_value(
                fields.require("security_identification_details")?,
            )?,
            security_reference_number: fields.require("security_reference_number")?.as_number()?,
            security_datetime: SecurityDateTime::from_value(fields.require("security_datetime")?)?,
            hash_algorithm: HashAlgorithm::from_value(fields.require("hash_algorithm")?)?,
            signature_algorithm: SignatureAlgorithm::from_value(fields.require("signature_algorithm")?)?,
            key_name: KeyName::from_value(fields.require("key_name")?)?,
        })
    }
}

/// Signature trailer, correlated to its header by the security reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTrailer {
    pub security_reference: String,
    pub validation_result: Option<Vec<u8>>,
    pub user_defined_signature: Option<UserDefinedSignature>,
}

impl TypedSegment for SignatureTrailer {
    const SCHEMA: &'static SegmentSchema = &HNSHA2;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new()
            .with("security_reference", self.security_reference.as_str())
            .with("validation_result", FieldValue::optional(self.validation_result.clone()))
            .with(
                "user_defined_signature",
                FieldValue::optional(self.user_defined_signature.as_ref().map(GroupRecord::to_record)),
            )
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            security_reference: fields.require("security_reference")?.as_text()?.to_string(),
            validation_result: fields
                .optional("validation_result")
                .map(|v| v.as_binary().map(<[u8]>::to_vec))
                .transpose()?,
            user_defined_signature: fields
                .optional("user_defined_signature")
                .map(UserDefinedSignature::from_value)
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use chrono::NaiveDate;

    fn datetime() -> SecurityDateTime {
        SecurityDateTime::at(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 8, 7)
                .unwrap(),
        )
    }

    fn encryption_header() -> EncryptionHeader {
        EncryptionHeader {
            security_profile: SecurityProfile::new(SecurityMethod::Pin, 1),
            security_function: "998".to_string(),
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender("SYS1"),
            security_datetime: datetime(),
            encryption_algorithm: EncryptionAlgorithm::pin_tan(),
            key_name: KeyName::new(BankIdentifier::german("12345678"), "user", KeyType::V),
            compression_function: CompressionFunction::Null,
        }
    }

    #[test]
    fn test_encryption_header_wire_form() {
        let segment = encryption_header().to_segment(998).unwrap();
        let mut expected = b"HNVSK:998:3+PIN:1+998+1+1::SYS1+1:20240305:090807+2:2:13:@8@".to_vec();
        expected.extend_from_slice(&[0u8; 8]);
        expected.extend_from_slice(b":5:1+280:12345678:user:V:0:0+0'");
        assert_eq!(segment.encode().unwrap(), expected);

        let decoded = Segment::decode(&expected).unwrap();
        assert_eq!(EncryptionHeader::from_segment(&decoded).unwrap(), encryption_header());
    }

    #[test]
    fn test_signature_header_wire_form() {
        let header = SignatureHeader {
            security_profile: SecurityProfile::new(SecurityMethod::Pin, 1),
            security_function: "999".to_string(),
            security_reference: "4711000".to_string(),
            security_application_area: SecurityApplicationArea::Shm,
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender("SYS1"),
            security_reference_number: 1,
            security_datetime: datetime(),
            hash_algorithm: HashAlgorithm::negotiate(),
            signature_algorithm: SignatureAlgorithm::rsa_iso9796_1(),
            key_name: KeyName::new(BankIdentifier::german("12345678"), "user", KeyType::S),
        };
        let segment = header.to_segment(2).unwrap();
        assert_eq!(
            segment.encode().unwrap(),
            b"HNSHK:2:4+PIN:1+999+4711000+1+1+1::SYS1+1+1:20240305:090807+1:999:1+6:10:16+280:12345678:user:S:0:0'"
                .to_vec()
        );
        assert_eq!(SignatureHeader::from_segment(&segment).unwrap(), header);
    }

    #[test]
    fn test_signature_trailer_wire_form() {
        let trailer = SignatureTrailer {
            security_reference: "4711000".to_string(),
            validation_result: None,
            user_defined_signature: Some(UserDefinedSignature {
                pin: "se:cret".to_string(),
                tan: None,
            }),
        };
        let segment = trailer.to_segment(5).unwrap();
        assert_eq!(segment.encode().unwrap(), b"HNSHA:5:2+4711000++se?:cret'".to_vec());
        assert_eq!(SignatureTrailer::from_segment(&segment).unwrap(), trailer);
    }

    #[test]
    fn test_encrypted_data_keeps_segments() {
        let inner = vec![
            Segment::decode(b"HKIDN:2:2+280:12345678+user+0+0'").unwrap(),
            Segment::decode(b"HKVVB:3:3+0+0+0+PRODUCT+1.0'").unwrap(),
        ];
        let container = EncryptedData { data: inner.clone() };
        let segment = container.to_segment(999).unwrap();
        assert_eq!(segment.element(0), &Element::Segments(inner.clone()));

        let wire = segment.encode().unwrap();
        let decoded = EncryptedData::from_segment(&Segment::decode(&wire).unwrap()).unwrap();
        assert_eq!(decoded.data, inner);
    }

    #[test]
    fn test_pin_too_long_rejected() {
        let trailer = SignatureTrailer {
            security_reference: "1".to_string(),
            validation_result: None,
            user_defined_signature: Some(UserDefinedSignature {
                pin: "x".repeat(100),
                tan: None,
            }),
        };
        assert!(trailer.to_segment(3).is_err());
    }
}
