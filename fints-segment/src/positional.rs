//! Positional segment adapter
//!
//! Older call sites build segments from an ordered list of raw values with no
//! field names. This adapter maps such a list onto a [`SegmentSchema`]; groups
//! are given as [`FieldValue::Group`] in schema order, and numeric fields also
//! take pre-rendered digit strings.

use crate::error::FintsResult;
use crate::schema::{FieldValue, GroupForm, SegmentSchema};
use crate::segment::Segment;

/// Build a segment from values in schema order
///
/// Missing trailing values are treated as absent.
pub fn encode_positional(schema: &SegmentSchema, number: u32, values: &[FieldValue]) -> FintsResult<Segment> {
    let refs: Vec<&FieldValue> = values.iter().collect();
    schema.build(number, &refs)
}

/// Read a segment into values in schema order
pub fn decode_positional(schema: &SegmentSchema, segment: &Segment) -> FintsResult<Vec<FieldValue>> {
    schema.read(segment, GroupForm::Positional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FintsError;
    use crate::legacy::{self, Subscriber};
    use crate::segments::{HNHBS1, HNSHK4};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    const SUBSCRIBER: Subscriber<'static> = Subscriber {
        bank_code: "12345678",
        user_id: "user",
        system_id: "SYS1",
    };

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, 24)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::text(value)
    }

    #[test]
    fn test_decode_signature_header_in_schema_order() {
        let segment = legacy::signature_header(2, "4711000", &SUBSCRIBER, 1, timestamp()).unwrap();
        let values = decode_positional(&HNSHK4, &segment).unwrap();

        assert_eq!(
            values,
            vec![
                FieldValue::Group(vec![text("PIN"), FieldValue::Number(1)]),
                text("999"),
                text("4711000"),
                text("1"),
                text("1"),
                FieldValue::Group(vec![text("1"), FieldValue::Absent, text("SYS1")]),
                FieldValue::Number(1),
                FieldValue::Group(vec![
                    text("1"),
                    FieldValue::Date(NaiveDate::from_ymd_opt(2023, 12, 24).unwrap()),
                    FieldValue::Time(NaiveTime::from_hms_opt(18, 30, 0).unwrap()),
                ]),
                FieldValue::Group(vec![text("1"), text("999"), text("1"), FieldValue::Absent]),
                FieldValue::Group(vec![text("6"), text("10"), text("16")]),
                FieldValue::Group(vec![
                    FieldValue::Group(vec![text("280"), text("12345678")]),
                    text("user"),
                    text("S"),
                    FieldValue::Number(0),
                    FieldValue::Number(0),
                ]),
                FieldValue::Absent,
            ]
        );

        // Decoded values encode back to the same segment.
        assert_eq!(encode_positional(&HNSHK4, 2, &values).unwrap(), segment);
    }

    #[test]
    fn test_decode_footer() {
        let segment = legacy::message_footer(3, 7).unwrap();
        assert_eq!(decode_positional(&HNHBS1, &segment).unwrap(), vec![FieldValue::Number(7)]);
    }

    #[test]
    fn test_decode_rejects_other_segment_type() {
        let segment = legacy::message_footer(3, 7).unwrap();
        assert!(matches!(
            decode_positional(&HNSHK4, &segment),
            Err(FintsError::Schema(_))
        ));
    }

    #[test]
    fn test_too_many_values() {
        let values = vec![FieldValue::Number(1), FieldValue::Number(2)];
        assert!(matches!(
            encode_positional(&HNHBS1, 3, &values),
            Err(FintsError::Schema(_))
        ));
    }
}
