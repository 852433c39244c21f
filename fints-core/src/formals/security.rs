//! Security data element groups
//!
//! These are the structural pieces carried by the encryption and signature
//! headers. Their meaning beyond the wire encoding is opaque to this layer.

use crate::formals::codes::{DateTimeType, IdentifiedRole, KeyType, SecurityMethod};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Country code of Germany as used in bank identifiers
pub const COUNTRY_CODE_GERMANY: &str = "280";

/// Security profile: which security scheme negotiated a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    pub security_method: SecurityMethod,
    pub security_method_version: u32,
}

impl SecurityProfile {
    pub fn new(security_method: SecurityMethod, security_method_version: u32) -> Self {
        Self {
            security_method,
            security_method_version,
        }
    }
}

/// Bank identifier (Kreditinstitutskennung)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BankIdentifier {
    pub country_identifier: String,
    pub bank_code: String,
}

impl BankIdentifier {
    /// Create a bank identifier for a German bank code (BLZ)
    pub fn german(bank_code: impl Into<String>) -> Self {
        Self {
            country_identifier: COUNTRY_CODE_GERMANY.to_string(),
            bank_code: bank_code.into(),
        }
    }
}

/// Security identification details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIdentificationDetails {
    pub identified_role: IdentifiedRole,
    /// Card identification, only used by chip card methods
    pub cid: Option<Vec<u8>>,
    pub identifier: String,
}

impl SecurityIdentificationDetails {
    /// Identify the message sender by its customer system id
    pub fn sender(system_id: impl Into<String>) -> Self {
        Self {
            identified_role: IdentifiedRole::Ms,
            cid: None,
            identifier: system_id.into(),
        }
    }
}

/// Security date and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDateTime {
    pub date_time_type: DateTimeType,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SecurityDateTime {
    /// Security timestamp for a given moment, truncated to whole seconds
    pub fn at(moment: NaiveDateTime) -> Self {
        let time = moment.time();
        Self {
            date_time_type: DateTimeType::Sts,
            date: moment.date(),
            time: time.with_nanosecond(0).unwrap_or(time),
        }
    }

    /// Security timestamp for the current local time
    pub fn now() -> Self {
        Self::at(Local::now().naive_local())
    }
}

/// Key name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyName {
    pub bank_identifier: BankIdentifier,
    pub user_id: String,
    pub key_type: KeyType,
    pub key_number: u32,
    pub key_version: u32,
}

impl KeyName {
    pub fn new(bank_identifier: BankIdentifier, user_id: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            bank_identifier,
            user_id: user_id.into(),
            key_type,
            key_number: 0,
            key_version: 0,
        }
    }
}

/// User-defined signature: the PIN/TAN "signature" payload
///
/// `Debug` masks the PIN and TAN.
#[derive(Clone, PartialEq, Eq)]
pub struct UserDefinedSignature {
    pub pin: String,
    pub tan: Option<String>,
}

impl fmt::Debug for UserDefinedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDefinedSignature")
            .field("pin", &"***")
            .field("tan", &self.tan.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Reference to an earlier message of a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMessage {
    pub dialog_id: String,
    pub message_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_truncates_to_seconds() {
        let moment = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 750)
            .unwrap();
        let dt = SecurityDateTime::at(moment);
        assert_eq!(dt.date_time_type, DateTimeType::Sts);
        assert_eq!(dt.time, NaiveTime::from_hms_opt(23, 59, 58).unwrap());
    }

    #[test]
    fn test_user_defined_signature_debug_hides_secrets() {
        let signature = UserDefinedSignature {
            pin: "4711".to_string(),
            tan: Some("982451".to_string()),
        };
        let debug = format!("{:?}", signature);
        assert!(!debug.contains("4711"));
        assert!(!debug.contains("982451"));
        assert!(debug.contains("Some(\"***\")"));
    }

    #[test]
    fn test_german_bank_identifier() {
        let blz = BankIdentifier::german("12345678");
        assert_eq!(blz.country_identifier, "280");
        assert_eq!(blz.bank_code, "12345678");
    }

    #[test]
    fn test_sender_identification() {
        let details = SecurityIdentificationDetails::sender("SYS1");
        assert_eq!(details.identified_role, IdentifiedRole::Ms);
        assert!(details.cid.is_none());
    }
}
