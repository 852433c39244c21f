//! Message model
//!
//! A message is an ordered sequence of segments bounded by the message header
//! (`HNHBK`) and, once closed, the message footer (`HNHBS`). The header carries
//! the total byte size of the encoded message, which is only known after all
//! envelope processing, so it is written by [`Message::encode`].
//!
//! # Lifecycle
//! 1. [`Message::new`] creates the header from the dialog context
//! 2. segments are appended with [`Message::push`]
//! 3. [`Message::close`] appends the footer
//! 4. security mechanisms rewrite the segment list in place
//! 5. [`Message::encode`] writes the size and renders the bytes

use crate::element::Element;
use crate::error::{ContractViolation, FintsResult};
use crate::segment::Segment;
use crate::segments::{EncryptedData, MessageFooter, MessageHeader, TypedSegment};
use fints_core::formals::BankIdentifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default HBCI version (FinTS 3.0)
pub const DEFAULT_HBCI_VERSION: u32 = 300;

/// Dialog data a message is built from
///
/// All values are opaque to this layer; they are copied into the header and
/// the security segments as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogContext {
    /// Customer system id; `"0"` before synchronisation
    pub system_id: String,
    pub bank_identifier: BankIdentifier,
    pub user_id: String,
    /// Dialog id; `"0"` for the first message of a dialog
    pub dialog_id: String,
    pub message_number: u32,
    pub hbci_version: u32,
}

impl Default for DialogContext {
    fn default() -> Self {
        Self {
            system_id: "0".to_string(),
            bank_identifier: BankIdentifier::german(""),
            user_id: String::new(),
            dialog_id: "0".to_string(),
            message_number: 1,
            hbci_version: DEFAULT_HBCI_VERSION,
        }
    }
}

impl DialogContext {
    /// Create a context for a German bank code and user id
    pub fn new(bank_code: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            bank_identifier: BankIdentifier::german(bank_code),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = system_id.into();
        self
    }

    pub fn with_bank_identifier(mut self, bank_identifier: BankIdentifier) -> Self {
        self.bank_identifier = bank_identifier;
        self
    }

    pub fn with_dialog_id(mut self, dialog_id: impl Into<String>) -> Self {
        self.dialog_id = dialog_id.into();
        self
    }

    pub fn with_message_number(mut self, message_number: u32) -> Self {
        self.message_number = message_number;
        self
    }

    pub fn with_hbci_version(mut self, hbci_version: u32) -> Self {
        self.hbci_version = hbci_version;
        self
    }
}

/// FinTS message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    context: Arc<DialogContext>,
    segments: Vec<Segment>,
    next_segment_number: u32,
}

impl Message {
    /// Create a message holding only the header (segment number 1)
    pub fn new(context: Arc<DialogContext>) -> FintsResult<Self> {
        let header = MessageHeader {
            message_size: 0,
            hbci_version: context.hbci_version,
            dialog_id: context.dialog_id.clone(),
            message_number: context.message_number,
            reference_message: None,
        };
        let segment = header.to_segment(1)?;
        Ok(Self {
            context,
            segments: vec![segment],
            next_segment_number: 2,
        })
    }

    /// Wrap existing segments; numbering continues after the highest
    /// ordinary segment number
    pub fn from_segments(context: Arc<DialogContext>, segments: Vec<Segment>) -> Self {
        let next_segment_number = next_number_after(&segments);
        Self {
            context,
            segments,
            next_segment_number,
        }
    }

    /// Append a segment, assigning the next sequence number
    ///
    /// # Returns
    /// The number assigned to the segment
    pub fn push(&mut self, mut segment: Segment) -> u32 {
        let number = self.next_segment_number;
        segment.set_number(number);
        self.segments.push(segment);
        self.next_segment_number += 1;
        number
    }

    /// Append the footer, repeating the header's message number
    pub fn close(&mut self) -> FintsResult<u32> {
        let header = self.header()?;
        let footer = MessageFooter {
            message_number: header.message_number,
        }
        .to_segment(self.next_segment_number)?;
        Ok(self.push(footer))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Mutable access for mechanisms that rewrite the segment list
    pub fn segments_mut(&mut self) -> &mut Vec<Segment> {
        &mut self.segments
    }

    /// First segment of the given type
    pub fn find_segment(&self, type_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.type_id() == type_id)
    }

    /// Check whether an identical segment is part of the message
    pub fn contains(&self, segment: &Segment) -> bool {
        self.segments.iter().any(|s| s == segment)
    }

    pub fn context(&self) -> &DialogContext {
        &self.context
    }

    /// Shared handle to the dialog context
    pub fn shared_context(&self) -> Arc<DialogContext> {
        Arc::clone(&self.context)
    }

    /// Read the message header
    ///
    /// # Errors
    /// A contract violation if the first segment is not `HNHBK`.
    pub fn header(&self) -> FintsResult<MessageHeader> {
        match self.segments.first() {
            Some(first) if MessageHeader::matches(first) => MessageHeader::from_segment(first),
            other => Err(ContractViolation::MissingHeader {
                found: other.map_or_else(|| "nothing".to_string(), |s| s.type_id().to_string()),
            }
            .into()),
        }
    }

    /// Write the total encoded size into the header
    ///
    /// The size field has a fixed width, so measuring once with any size in
    /// place gives the final length.
    pub fn update_size(&mut self) -> FintsResult<u64> {
        let mut header = self.header()?;
        let number = self.segments[0].number();
        let size = self.render()?.len() as u64;
        header.message_size = size;
        self.segments[0] = header.to_segment(number)?;
        Ok(size)
    }

    /// Encode the message with its final size
    pub fn encode(&mut self) -> FintsResult<Vec<u8>> {
        let size = self.update_size()?;
        let bytes = self.render()?;
        log::debug!("Encoded message of {} segments, {} bytes", self.segments.len(), size);
        Ok(bytes)
    }

    fn render(&self) -> FintsResult<Vec<u8>> {
        let mut out = Vec::new();
        for segment in &self.segments {
            segment.write(&mut out)?;
        }
        Ok(out)
    }

    /// Decode an inbound message
    ///
    /// The data element of `HNVSD` is read back as a nested segment sequence.
    pub fn decode(context: Arc<DialogContext>, data: &[u8]) -> FintsResult<Self> {
        let mut segments = Segment::decode_all(data)?;
        for segment in segments.iter_mut().filter(|s| EncryptedData::matches(s)) {
            let nested = segment.nested_segments(0)?;
            segment.set_element(0, Element::Segments(nested));
        }
        log::debug!("Decoded message of {} segments", segments.len());
        Ok(Self::from_segments(context, segments))
    }
}

// Envelope segments carry fixed numbers (998, 999) and do not count.
fn next_number_after(segments: &[Segment]) -> u32 {
    segments
        .iter()
        .map(Segment::number)
        .filter(|n| *n < 998)
        .max()
        .map_or(1, |n| n + 1)
}
