//! Message header (`HNHBK`) and message footer (`HNHBS`)

use super::TypedSegment;
use crate::error::FintsResult;
use crate::groups::GroupRecord;
use crate::schema::{FieldDef, FieldType, FieldValue, NamedFields, SegmentSchema};
use fints_core::formals::ReferenceMessage;

/// Width of the zero-padded message size
pub const MESSAGE_SIZE_LENGTH: usize = 12;

/// Nachrichtenkopf, version 3
pub const HNHBK3: SegmentSchema = SegmentSchema {
    type_id: "HNHBK",
    version: 3,
    fields: &[
        FieldDef::required("message_size", FieldType::ZeroPadded { length: MESSAGE_SIZE_LENGTH }),
        FieldDef::required("hbci_version", FieldType::Numeric { max_length: 3 }),
        FieldDef::required("dialog_id", FieldType::Identifier),
        FieldDef::required("message_number", FieldType::Numeric { max_length: 4 }),
        FieldDef::optional("reference_message", FieldType::Group(ReferenceMessage::FIELDS)),
    ],
};

/// Nachrichtenabschluss, version 1
pub const HNHBS1: SegmentSchema = SegmentSchema {
    type_id: "HNHBS",
    version: 1,
    fields: &[FieldDef::required("message_number", FieldType::Numeric { max_length: 4 })],
};

/// Message header
///
/// The size is the byte length of the whole message after all envelope
/// wrapping, see `Message::encode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_size: u64,
    pub hbci_version: u32,
    pub dialog_id: String,
    pub message_number: u32,
    pub reference_message: Option<ReferenceMessage>,
}

impl TypedSegment for MessageHeader {
    const SCHEMA: &'static SegmentSchema = &HNHBK3;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new()
            .with("message_size", self.message_size)
            .with("hbci_version", self.hbci_version)
            .with("dialog_id", self.dialog_id.as_str())
            .with("message_number", self.message_number)
            .with(
                "reference_message",
                FieldValue::optional(self.reference_message.as_ref().map(GroupRecord::to_record)),
            )
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            message_size: fields.require("message_size")?.as_number()?,
            hbci_version: fields.require("hbci_version")?.as_u32()?,
            dialog_id: fields.require("dialog_id")?.as_text()?.to_string(),
            message_number: fields.require("message_number")?.as_u32()?,
            reference_message: fields
                .optional("reference_message")
                .map(ReferenceMessage::from_value)
                .transpose()?,
        })
    }
}

/// Message footer, repeating the header's message number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFooter {
    pub message_number: u32,
}

impl TypedSegment for MessageFooter {
    const SCHEMA: &'static SegmentSchema = &HNHBS1;

    fn to_fields(&self) -> NamedFields {
        NamedFields::new().with("message_number", self.message_number)
    }

    fn from_fields(fields: &NamedFields) -> FintsResult<Self> {
        Ok(Self {
            message_number: fields.require("message_number")?.as_u32()?,
        })
    }
}
