//! Field schema shared by the positional and named segment adapters
//!
//! Every segment type is described once, as a [`SegmentSchema`]: its type id,
//! version and ordered [`FieldDef`]s. The field codec in this module turns
//! [`FieldValue`]s into wire [`Element`]s and back. The positional adapter
//! (values in schema order) and the named adapter (values by field name) only
//! differ in how they look values up, so both produce identical wire text for
//! the same logical content.
//!
//! # Why flat items?
//! Data element groups are flat on the wire: a group nested in a group (the
//! bank identifier inside a key name) just contributes its items in place.
//! Encoding therefore emits a flat item list per top-level field, and decoding
//! walks that list with a cursor, consuming as many items as each field's type
//! occupies. An absent optional group still occupies its item positions so
//! that the fields after it stay aligned.

use crate::element::Element;
use crate::error::{FintsError, FintsResult};
use crate::segment::{Segment, SegmentHeader};
use chrono::{NaiveDate, NaiveTime};

/// Maximum length of an identifier field
pub const IDENTIFIER_MAX_LENGTH: usize = 30;

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H%M%S";

/// Type of a field and its constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Digits without leading zeros
    Numeric { max_length: usize },
    /// Digits left-padded with zeros to a fixed width
    ZeroPadded { length: usize },
    /// Free text
    Alphanumeric { max_length: usize },
    /// Identifier text, at most [`IDENTIFIER_MAX_LENGTH`] characters
    Identifier,
    /// Coded value; an empty domain accepts any code
    Code {
        max_length: usize,
        codes: &'static [&'static str],
    },
    /// Date as `YYYYMMDD`
    Date,
    /// Time as `HHMMSS`
    Time,
    /// Length-prefixed binary data
    Binary { max_length: Option<usize> },
    /// Data element group
    Group(&'static [FieldDef]),
    /// Sequence of complete segments, carried as one binary block
    SegmentSequence,
}

impl FieldType {
    /// Number of wire items a value of this type occupies
    pub fn item_count(&self) -> usize {
        match self {
            FieldType::Group(fields) => fields.iter().map(|f| f.field_type.item_count()).sum(),
            _ => 1,
        }
    }
}

/// Definition of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldDef {
    /// Define a required field
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    /// Define an optional field
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Schema of one segment type and version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSchema {
    pub type_id: &'static str,
    pub version: u32,
    pub fields: &'static [FieldDef],
}

/// Value of a field, before encoding or after decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Number(u64),
    Text(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Group values in schema order (positional adapter)
    Group(Vec<FieldValue>),
    /// Group values by name (named adapter)
    Record(NamedFields),
    Segments(Vec<Segment>),
}

impl FieldValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Create an optional value; `None` is absent
    pub fn optional<T: Into<FieldValue>>(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, Into::into)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Get the value as text
    pub fn as_text(&self) -> FintsResult<&str> {
        match self {
            FieldValue::Text(text) => Ok(text),
            other => Err(kind_mismatch("text", other)),
        }
    }

    /// Get the value as a number
    pub fn as_number(&self) -> FintsResult<u64> {
        match self {
            FieldValue::Number(n) => Ok(*n),
            FieldValue::Text(text) => parse_digits(text),
            other => Err(kind_mismatch("number", other)),
        }
    }

    /// Get the value as a number that fits 32 bits
    pub fn as_u32(&self) -> FintsResult<u32> {
        let n = self.as_number()?;
        u32::try_from(n).map_err(|_| FintsError::InvalidData(format!("{} does not fit 32 bits", n)))
    }

    pub fn as_binary(&self) -> FintsResult<&[u8]> {
        match self {
            FieldValue::Binary(data) => Ok(data),
            other => Err(kind_mismatch("binary", other)),
        }
    }

    pub fn as_date(&self) -> FintsResult<NaiveDate> {
        match self {
            FieldValue::Date(date) => Ok(*date),
            other => Err(kind_mismatch("date", other)),
        }
    }

    pub fn as_time(&self) -> FintsResult<NaiveTime> {
        match self {
            FieldValue::Time(time) => Ok(*time),
            other => Err(kind_mismatch("time", other)),
        }
    }

    pub fn as_record(&self) -> FintsResult<&NamedFields> {
        match self {
            FieldValue::Record(record) => Ok(record),
            other => Err(kind_mismatch("record", other)),
        }
    }

    pub fn as_segments(&self) -> FintsResult<&[Segment]> {
        match self {
            FieldValue::Segments(segments) => Ok(segments),
            other => Err(kind_mismatch("segment sequence", other)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(u64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

impl From<NamedFields> for FieldValue {
    fn from(value: NamedFields) -> Self {
        FieldValue::Record(value)
    }
}

fn kind_mismatch(expected: &str, found: &FieldValue) -> FintsError {
    FintsError::Schema(format!("expected a {} value, got {:?}", expected, found))
}

/// Field values by name, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedFields {
    entries: Vec<(String, FieldValue)>,
}

impl NamedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value, builder style
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a value
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Get a value; missing names read as absent
    pub fn get(&self, name: &str) -> &FieldValue {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map_or(&FieldValue::Absent, |(_, v)| v)
    }

    /// Get a value that must be present
    pub fn require(&self, name: &str) -> FintsResult<&FieldValue> {
        match self.get(name) {
            FieldValue::Absent => Err(FintsError::Schema(format!("missing field {}", name))),
            value => Ok(value),
        }
    }

    /// Get a value that may be absent
    pub fn optional(&self, name: &str) -> Option<&FieldValue> {
        match self.get(name) {
            FieldValue::Absent => None,
            value => Some(value),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// How decoded groups are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupForm {
    Positional,
    Named,
}

impl SegmentSchema {
    /// Check that a segment matches this schema's type and version
    pub fn check_header(&self, header: &SegmentHeader) -> FintsResult<()> {
        if header.type_id != self.type_id || header.version != self.version {
            return Err(FintsError::Schema(format!(
                "segment {}:{} does not match schema {}:{}",
                header.type_id, header.version, self.type_id, self.version
            )));
        }
        Ok(())
    }

    /// Build a segment from one value per field, in schema order
    pub(crate) fn build(&self, number: u32, values: &[&FieldValue]) -> FintsResult<Segment> {
        if values.len() > self.fields.len() {
            return Err(FintsError::Schema(format!(
                "{} has {} fields, got {} values",
                self.type_id,
                self.fields.len(),
                values.len()
            )));
        }

        let mut elements = Vec::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or(&FieldValue::Absent);
            let mut items = Vec::with_capacity(field.field_type.item_count());
            encode_field(field, value, &mut items)
                .map_err(|e| in_context(e, self.type_id, field.name))?;
            elements.push(Element::group(items));
        }

        Ok(Segment::new(
            SegmentHeader::new(self.type_id, number, self.version),
            elements,
        ))
    }

    /// Read one value per field, in schema order
    pub(crate) fn read(&self, segment: &Segment, form: GroupForm) -> FintsResult<Vec<FieldValue>> {
        self.check_header(segment.header())?;
        let mut values = Vec::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            let element = segment.element(i);
            let mut cursor = ItemCursor::new(element.items());
            let value = decode_field(field, &mut cursor, form)
                .map_err(|e| in_context(e, self.type_id, field.name))?;
            values.push(value);
        }
        Ok(values)
    }
}

fn in_context(error: FintsError, type_id: &str, field: &str) -> FintsError {
    match error {
        FintsError::InvalidData(msg) => FintsError::InvalidData(format!("{}.{}: {}", type_id, field, msg)),
        FintsError::Schema(msg) => FintsError::Schema(format!("{}.{}: {}", type_id, field, msg)),
        FintsError::Syntax(msg) => FintsError::Syntax(format!("{}.{}: {}", type_id, field, msg)),
        other => other,
    }
}

fn encode_field(field: &FieldDef, value: &FieldValue, items: &mut Vec<Element>) -> FintsResult<()> {
    if value.is_absent() {
        if field.required {
            return Err(FintsError::Schema(format!("missing required field {}", field.name)));
        }
        items.extend(std::iter::repeat_n(Element::Empty, field.field_type.item_count()));
        return Ok(());
    }

    match field.field_type {
        FieldType::Group(fields) => encode_group(fields, value, items),
        scalar => {
            let element = encode_scalar(field.name, scalar, value)?;
            items.push(element);
            Ok(())
        }
    }
}

fn encode_group(fields: &'static [FieldDef], value: &FieldValue, items: &mut Vec<Element>) -> FintsResult<()> {
    match value {
        FieldValue::Group(values) => {
            if values.len() > fields.len() {
                return Err(FintsError::Schema(format!(
                    "group has {} fields, got {} values",
                    fields.len(),
                    values.len()
                )));
            }
            for (i, field) in fields.iter().enumerate() {
                let value = values.get(i).unwrap_or(&FieldValue::Absent);
                encode_field(field, value, items).map_err(|e| in_context(e, "group", field.name))?;
            }
            Ok(())
        }
        FieldValue::Record(record) => {
            if let Some(unknown) = record.names().find(|n| !fields.iter().any(|f| f.name == *n)) {
                return Err(FintsError::Schema(format!("unknown field {}", unknown)));
            }
            for field in fields {
                encode_field(field, record.get(field.name), items)
                    .map_err(|e| in_context(e, "group", field.name))?;
            }
            Ok(())
        }
        other => Err(kind_mismatch("group or record", other)),
    }
}

fn encode_scalar(name: &str, field_type: FieldType, value: &FieldValue) -> FintsResult<Element> {
    match field_type {
        FieldType::Numeric { max_length } => {
            let digits = value.as_number()?.to_string();
            check_length(name, digits.len(), max_length)?;
            Ok(Element::text(digits))
        }
        FieldType::ZeroPadded { length } => {
            let digits = format!("{:0width$}", value.as_number()?, width = length);
            if digits.len() != length {
                return Err(FintsError::InvalidData(format!(
                    "{} does not fit {} digits",
                    digits, length
                )));
            }
            Ok(Element::text(digits))
        }
        FieldType::Alphanumeric { max_length } => {
            let text = scalar_text(value)?;
            check_length(name, text.chars().count(), max_length)?;
            Ok(Element::text(text))
        }
        FieldType::Identifier => {
            let text = scalar_text(value)?;
            check_length(name, text.chars().count(), IDENTIFIER_MAX_LENGTH)?;
            Ok(Element::text(text))
        }
        FieldType::Code { max_length, codes } => {
            let code = scalar_text(value)?;
            check_length(name, code.chars().count(), max_length)?;
            if !codes.is_empty() && !codes.contains(&code.as_str()) {
                return Err(FintsError::InvalidData(format!(
                    "{:?} is not one of {:?}",
                    code, codes
                )));
            }
            Ok(Element::text(code))
        }
        FieldType::Date => {
            let date = match value {
                FieldValue::Date(date) => *date,
                FieldValue::Text(text) => parse_date(text)?,
                other => return Err(kind_mismatch("date", other)),
            };
            Ok(Element::text(date.format(DATE_FORMAT).to_string()))
        }
        FieldType::Time => {
            let time = match value {
                FieldValue::Time(time) => *time,
                FieldValue::Text(text) => parse_time(text)?,
                other => return Err(kind_mismatch("time", other)),
            };
            Ok(Element::text(time.format(TIME_FORMAT).to_string()))
        }
        FieldType::Binary { max_length } => {
            let data = value.as_binary()?;
            if let Some(max_length) = max_length {
                check_length(name, data.len(), max_length)?;
            }
            Ok(Element::binary(data.to_vec()))
        }
        FieldType::SegmentSequence => match value {
            FieldValue::Segments(segments) => Ok(Element::Segments(segments.clone())),
            FieldValue::Binary(data) => Ok(Element::Segments(Segment::decode_all(data)?)),
            other => Err(kind_mismatch("segment sequence", other)),
        },
        FieldType::Group(_) => Err(FintsError::Schema(format!("{} is a group", name))),
    }
}

fn scalar_text(value: &FieldValue) -> FintsResult<String> {
    match value {
        FieldValue::Text(text) => Ok(text.clone()),
        FieldValue::Number(n) => Ok(n.to_string()),
        other => Err(kind_mismatch("text", other)),
    }
}

fn check_length(name: &str, length: usize, max_length: usize) -> FintsResult<()> {
    if length > max_length {
        return Err(FintsError::InvalidData(format!(
            "{} is {} long, at most {} allowed",
            name, length, max_length
        )));
    }
    Ok(())
}

fn parse_digits(text: &str) -> FintsResult<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FintsError::InvalidData(format!("{:?} is not numeric", text)));
    }
    text.parse()
        .map_err(|_| FintsError::InvalidData(format!("{:?} is out of range", text)))
}

fn parse_date(text: &str) -> FintsResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| FintsError::InvalidData(format!("invalid date {:?}: {}", text, e)))
}

fn parse_time(text: &str) -> FintsResult<NaiveTime> {
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .map_err(|e| FintsError::InvalidData(format!("invalid time {:?}: {}", text, e)))
}

/// Cursor over the flat items of one data element
struct ItemCursor<'a> {
    items: &'a [Element],
    position: usize,
}

impl<'a> ItemCursor<'a> {
    fn new(items: &'a [Element]) -> Self {
        Self { items, position: 0 }
    }

    fn next(&mut self) -> &'a Element {
        let item = self.items.get(self.position).unwrap_or(&Element::Empty);
        self.position += 1;
        item
    }
}

fn decode_field(field: &FieldDef, cursor: &mut ItemCursor<'_>, form: GroupForm) -> FintsResult<FieldValue> {
    match field.field_type {
        FieldType::Group(fields) => {
            let mut values = Vec::with_capacity(fields.len());
            for inner in fields {
                values.push(decode_field(inner, cursor, form)?);
            }
            if values.iter().all(FieldValue::is_absent) {
                return Ok(FieldValue::Absent);
            }
            Ok(match form {
                GroupForm::Positional => FieldValue::Group(values),
                GroupForm::Named => {
                    let mut record = NamedFields::new();
                    for (inner, value) in fields.iter().zip(values) {
                        if !value.is_absent() {
                            record.set(inner.name, value);
                        }
                    }
                    FieldValue::Record(record)
                }
            })
        }
        scalar => decode_scalar(scalar, cursor.next()),
    }
}

fn decode_scalar(field_type: FieldType, item: &Element) -> FintsResult<FieldValue> {
    if item.is_empty() {
        return Ok(FieldValue::Absent);
    }

    match field_type {
        FieldType::Numeric { .. } | FieldType::ZeroPadded { .. } => {
            Ok(FieldValue::Number(parse_digits(item_text(item)?)?))
        }
        FieldType::Alphanumeric { .. } | FieldType::Identifier | FieldType::Code { .. } => {
            Ok(FieldValue::Text(item_text(item)?.to_string()))
        }
        FieldType::Date => Ok(FieldValue::Date(parse_date(item_text(item)?)?)),
        FieldType::Time => Ok(FieldValue::Time(parse_time(item_text(item)?)?)),
        FieldType::Binary { .. } => match item {
            Element::Binary(data) => Ok(FieldValue::Binary(data.clone())),
            other => Err(FintsError::Syntax(format!("expected binary data, got {:?}", other))),
        },
        FieldType::SegmentSequence => match item {
            Element::Segments(segments) => Ok(FieldValue::Segments(segments.clone())),
            Element::Binary(data) => Ok(FieldValue::Segments(Segment::decode_all(data)?)),
            other => Err(FintsError::Syntax(format!("expected segment sequence, got {:?}", other))),
        },
        FieldType::Group(_) => Err(FintsError::Schema("group decoded as scalar".to_string())),
    }
}

fn item_text(item: &Element) -> FintsResult<&str> {
    item.as_text()
        .ok_or_else(|| FintsError::Syntax(format!("expected text, got {:?}", item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INNER: &[FieldDef] = &[
        FieldDef::required("country", FieldType::Alphanumeric { max_length: 3 }),
        FieldDef::required("code", FieldType::Alphanumeric { max_length: 30 }),
    ];

    const OUTER: &[FieldDef] = &[
        FieldDef::required("bank", FieldType::Group(INNER)),
        FieldDef::optional("extra", FieldType::Binary { max_length: Some(4) }),
        FieldDef::required("kind", FieldType::Code { max_length: 1, codes: &["S", "V"] }),
    ];

    static TEST: SegmentSchema = SegmentSchema {
        type_id: "HKTST",
        version: 2,
        fields: &[
            FieldDef::required("counter", FieldType::ZeroPadded { length: 4 }),
            FieldDef::required("key", FieldType::Group(OUTER)),
            FieldDef::optional("when", FieldType::Date),
            FieldDef::optional("note", FieldType::Alphanumeric { max_length: 5 }),
        ],
    };

    fn values() -> Vec<FieldValue> {
        vec![
            FieldValue::Number(42),
            FieldValue::Group(vec![
                FieldValue::Group(vec!["280".into(), "12345678".into()]),
                FieldValue::Absent,
                "V".into(),
            ]),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        ]
    }

    fn build(values: &[FieldValue]) -> FintsResult<Segment> {
        let refs: Vec<&FieldValue> = values.iter().collect();
        TEST.build(3, &refs)
    }

    #[test]
    fn test_item_count() {
        assert_eq!(FieldType::Group(OUTER).item_count(), 4);
    }

    #[test]
    fn test_build_flattens_groups() {
        let segment = build(&values()).unwrap();
        assert_eq!(
            segment.encode().unwrap(),
            b"HKTST:3:2+0042+280:12345678::V+20240131'".to_vec()
        );
    }

    #[test]
    fn test_read_realigns_after_absent_field() {
        let segment = build(&values()).unwrap();
        let read = TEST.read(&segment, GroupForm::Positional).unwrap();
        assert_eq!(read[0], FieldValue::Number(42));
        assert_eq!(read[1], values()[1]);
        assert_eq!(read[3], FieldValue::Absent);
    }

    #[test]
    fn test_read_named_groups() {
        let segment = build(&values()).unwrap();
        let read = TEST.read(&segment, GroupForm::Named).unwrap();
        let key = read[1].as_record().unwrap();
        let bank = key.require("bank").unwrap().as_record().unwrap();
        assert_eq!(bank.require("code").unwrap().as_text().unwrap(), "12345678");
        assert!(key.optional("extra").is_none());
    }

    #[test]
    fn test_code_domain_enforced() {
        let mut v = values();
        v[1] = FieldValue::Group(vec![
            FieldValue::Group(vec!["280".into(), "1".into()]),
            FieldValue::Absent,
            "X".into(),
        ]);
        assert!(matches!(build(&v), Err(FintsError::InvalidData(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let v = vec![FieldValue::Number(1)];
        assert!(matches!(build(&v), Err(FintsError::Schema(_))));
    }

    #[test]
    fn test_length_limits() {
        let mut v = values();
        v.push("too long".into());
        assert!(matches!(build(&v), Err(FintsError::InvalidData(_))));

        let mut v = values();
        v[0] = FieldValue::Number(12345);
        assert!(matches!(build(&v), Err(FintsError::InvalidData(_))));
    }

    #[test]
    fn test_numeric_text_is_normalized() {
        let mut v = values();
        v[0] = "42".into();
        assert_eq!(build(&v).unwrap(), build(&values()).unwrap());

        v[0] = "4x".into();
        assert!(matches!(build(&v), Err(FintsError::InvalidData(_))));
    }

    #[test]
    fn test_wrong_kind() {
        let mut v = values();
        v[0] = FieldValue::Binary(vec![1]);
        assert!(matches!(build(&v), Err(FintsError::Schema(_))));
    }

    #[test]
    fn test_header_mismatch() {
        let other = Segment::new(SegmentHeader::new("HKTST", 1, 1), vec![]);
        assert!(matches!(TEST.read(&other, GroupForm::Positional), Err(FintsError::Schema(_))));
    }
}
