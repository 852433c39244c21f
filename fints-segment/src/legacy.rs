//! Legacy positional segment constructors
//!
//! Older message-construction code builds the framing and security segments
//! from ordered raw values. These helpers keep that calling convention but go
//! through the same schemas as the typed segments, so both produce the same
//! wire text.

use crate::error::FintsResult;
use crate::positional::encode_positional;
use crate::schema::FieldValue;
use crate::segment::Segment;
use crate::segments::{HNHBK3, HNHBS1, HNSHA2, HNSHK4, HNVSD1, HNVSK3};
use chrono::NaiveDateTime;
use fints_core::formals::COUNTRY_CODE_GERMANY;

/// HBCI version written by the legacy header
pub const LEGACY_HBCI_VERSION: u32 = 300;

const SECURITY_FUNCTION_ENCRYPTION: &str = "998";
const SECURITY_FUNCTION_SIGNATURE: &str = "999";
const SECURITY_BOUNDARY_SHM: &str = "1";
const SECURITY_SUPPLIER_ROLE_ISS: &str = "1";
const COMPRESSION_NONE: &str = "0";

/// Identity of the customer a legacy security segment is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscriber<'a> {
    pub bank_code: &'a str,
    pub user_id: &'a str,
    pub system_id: &'a str,
}

fn text(value: impl Into<String>) -> FieldValue {
    FieldValue::text(value)
}

fn group(values: Vec<FieldValue>) -> FieldValue {
    FieldValue::Group(values)
}

fn security_profile(profile_version: u32) -> FieldValue {
    group(vec![text("PIN"), text(profile_version.to_string())])
}

fn identification(subscriber: &Subscriber<'_>) -> FieldValue {
    group(vec![text("1"), FieldValue::Absent, text(subscriber.system_id)])
}

fn datetime(timestamp: NaiveDateTime) -> FieldValue {
    group(vec![
        text("1"),
        text(timestamp.format("%Y%m%d").to_string()),
        text(timestamp.format("%H%M%S").to_string()),
    ])
}

fn key_name(subscriber: &Subscriber<'_>, key_type: &str) -> FieldValue {
    group(vec![
        group(vec![text(COUNTRY_CODE_GERMANY), text(subscriber.bank_code)]),
        text(subscriber.user_id),
        text(key_type),
        text("0"),
        text("0"),
    ])
}

/// `HNHBK`: message header, always segment number 1
///
/// `message_size` is written as given, zero-padded to 12 digits. It must be
/// the byte length of the whole encoded message: the header's own length is
/// not added to a body length here. `Message::encode` computes it correctly.
pub fn message_header(message_size: u64, dialog_id: &str, message_number: u32) -> FintsResult<Segment> {
    encode_positional(
        &HNHBK3,
        1,
        &[
            text(format!("{:012}", message_size)),
            text(LEGACY_HBCI_VERSION.to_string()),
            text(dialog_id),
            text(message_number.to_string()),
        ],
    )
}

/// `HNSHK`: signature header
pub fn signature_header(
    number: u32,
    security_reference: &str,
    subscriber: &Subscriber<'_>,
    profile_version: u32,
    timestamp: NaiveDateTime,
) -> FintsResult<Segment> {
    encode_positional(
        &HNSHK4,
        number,
        &[
            security_profile(profile_version),
            text(SECURITY_FUNCTION_SIGNATURE),
            text(security_reference),
            text(SECURITY_BOUNDARY_SHM),
            text(SECURITY_SUPPLIER_ROLE_ISS),
            identification(subscriber),
            text("1"),
            datetime(timestamp),
            group(vec![text("1"), text("999"), text("1")]),
            group(vec![text("6"), text("10"), text("16")]),
            key_name(subscriber, "S"),
        ],
    )
}

/// `HNVSK`: encryption header
pub fn encryption_header(
    number: u32,
    subscriber: &Subscriber<'_>,
    profile_version: u32,
    timestamp: NaiveDateTime,
) -> FintsResult<Segment> {
    encode_positional(
        &HNVSK3,
        number,
        &[
            security_profile(profile_version),
            text(SECURITY_FUNCTION_ENCRYPTION),
            text(SECURITY_SUPPLIER_ROLE_ISS),
            identification(subscriber),
            datetime(timestamp),
            group(vec![
                text("2"),
                text("2"),
                text("13"),
                FieldValue::Binary(vec![0; 8]),
                text("5"),
                text("1"),
            ]),
            key_name(subscriber, "V"),
            text(COMPRESSION_NONE),
        ],
    )
}

/// `HNVSD`: encrypted data wrapping already encoded segments
pub fn encrypted_data(number: u32, encoded_data: &[u8]) -> FintsResult<Segment> {
    encode_positional(&HNVSD1, number, &[FieldValue::Binary(encoded_data.to_vec())])
}

/// `HNSHA`: signature trailer carrying PIN and optional TAN
pub fn signature_trailer(
    number: u32,
    security_reference: &str,
    pin: &str,
    tan: Option<&str>,
) -> FintsResult<Segment> {
    encode_positional(
        &HNSHA2,
        number,
        &[
            text(security_reference),
            FieldValue::Absent,
            group(vec![text(pin), FieldValue::optional(tan)]),
        ],
    )
}

/// `HNHBS`: message footer
pub fn message_footer(number: u32, message_number: u32) -> FintsResult<Segment> {
    encode_positional(&HNHBS1, number, &[text(message_number.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::*;
    use chrono::NaiveDate;
    use fints_core::formals::*;

    const SUBSCRIBER: Subscriber<'static> = Subscriber {
        bank_code: "12345678",
        user_id: "test?user",
        system_id: "SYS:1",
    };

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, 24)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn encoded(segment: FintsResult<Segment>) -> Vec<u8> {
        segment.unwrap().encode().unwrap()
    }

    #[test]
    fn test_message_header_writes_size_as_given() {
        assert_eq!(
            encoded(message_header(417, "0", 1)),
            b"HNHBK:1:3+000000000417+300+0+1'".to_vec()
        );
        assert!(message_header(1_000_000_000_000, "0", 1).is_err());
    }

    #[test]
    fn test_message_header_matches_typed() {
        let typed = MessageHeader {
            message_size: 417,
            hbci_version: 300,
            dialog_id: "0".to_string(),
            message_number: 1,
            reference_message: None,
        };
        assert_eq!(encoded(message_header(417, "0", 1)), encoded(typed.to_segment(1)));
    }

    #[test]
    fn test_signature_header_matches_typed() {
        let typed = SignatureHeader {
            security_profile: SecurityProfile::new(SecurityMethod::Pin, 2),
            security_function: "999".to_string(),
            security_reference: "1234567".to_string(),
            security_application_area: SecurityApplicationArea::Shm,
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender("SYS:1"),
            security_reference_number: 1,
            security_datetime: SecurityDateTime::at(timestamp()),
            hash_algorithm: HashAlgorithm::negotiate(),
            signature_algorithm: SignatureAlgorithm::rsa_iso9796_1(),
            key_name: KeyName::new(BankIdentifier::german("12345678"), "test?user", KeyType::S),
        };
        let legacy = encoded(signature_header(2, "1234567", &SUBSCRIBER, 2, timestamp()));
        assert_eq!(legacy, encoded(typed.to_segment(2)));
        assert!(legacy.windows(6).any(|w| w == b"SYS?:1"));
    }

    #[test]
    fn test_encryption_header_matches_typed() {
        let typed = EncryptionHeader {
            security_profile: SecurityProfile::new(SecurityMethod::Pin, 1),
            security_function: "998".to_string(),
            security_role: SecurityRole::Iss,
            security_identification_details: SecurityIdentificationDetails::sender("SYS:1"),
            security_datetime: SecurityDateTime::at(timestamp()),
            encryption_algorithm: EncryptionAlgorithm::pin_tan(),
            key_name: KeyName::new(BankIdentifier::german("12345678"), "test?user", KeyType::V),
            compression_function: CompressionFunction::Null,
        };
        assert_eq!(
            encoded(encryption_header(998, &SUBSCRIBER, 1, timestamp())),
            encoded(typed.to_segment(998))
        );
    }

    #[test]
    fn test_encrypted_data_matches_typed() {
        let inner = b"HKIDN:2:2+280:12345678+user+0+0'HKVVB:3:3+0+0+0+PRODUCT+1.0'";
        let typed = EncryptedData {
            data: Segment::decode_all(inner).unwrap(),
        };
        let legacy = encoded(encrypted_data(999, inner));
        assert_eq!(legacy, encoded(typed.to_segment(999)));
        assert!(legacy.starts_with(format!("HNVSD:999:1+@{}@", inner.len()).as_bytes()));
    }

    #[test]
    fn test_signature_trailer_matches_typed() {
        let typed = SignatureTrailer {
            security_reference: "1234567".to_string(),
            validation_result: None,
            user_defined_signature: Some(UserDefinedSignature {
                pin: "12'34".to_string(),
                tan: Some("999888".to_string()),
            }),
        };
        let legacy = encoded(signature_trailer(4, "1234567", "12'34", Some("999888")));
        assert_eq!(legacy, encoded(typed.to_segment(4)));
        assert_eq!(legacy, b"HNSHA:4:2+1234567++12?'34:999888'".to_vec());
    }

    #[test]
    fn test_message_footer_matches_typed() {
        let typed = MessageFooter { message_number: 3 };
        assert_eq!(encoded(message_footer(5, 3)), encoded(typed.to_segment(5)));
    }

    #[test]
    fn test_legacy_values_are_validated() {
        assert!(message_header(1, &"x".repeat(31), 1).is_err());
        assert!(message_footer(2, 12345).is_err());
    }
}
