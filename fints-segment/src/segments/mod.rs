//! Typed segment definitions
//!
//! Each typed segment owns one [`SegmentSchema`] and converts itself through
//! the named adapter.

pub mod message;
pub mod security;

use crate::error::FintsResult;
use crate::named::{decode_named, encode_named};
use crate::schema::{NamedFields, SegmentSchema};
use crate::segment::Segment;

pub use message::{MessageFooter, MessageHeader, HNHBK3, HNHBS1};
pub use security::{
    EncryptedData, EncryptionHeader, SignatureHeader, SignatureTrailer, HNSHA2, HNSHK4, HNVSD1, HNVSK3,
};

/// A segment type with a fixed schema
pub trait TypedSegment: Sized {
    /// Schema of the segment
    const SCHEMA: &'static SegmentSchema;

    /// Describe the segment content by field name
    fn to_fields(&self) -> NamedFields;

    /// Rebuild the segment from decoded fields
    fn from_fields(fields: &NamedFields) -> FintsResult<Self>;

    /// Build the wire segment with the given sequence number
    fn to_segment(&self, number: u32) -> FintsResult<Segment> {
        encode_named(Self::SCHEMA, number, &self.to_fields())
    }

    /// Read the typed segment from a wire segment
    fn from_segment(segment: &Segment) -> FintsResult<Self> {
        Self::from_fields(&decode_named(Self::SCHEMA, segment)?)
    }

    /// Check whether a wire segment has this segment's type
    fn matches(segment: &Segment) -> bool {
        segment.type_id() == Self::SCHEMA.type_id
    }
}
