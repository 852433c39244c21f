//! Segment structure and wire encoding/decoding
//!
//! # Segment Format
//!
//! ```text
//! TYPE:NUMBER:VERSION[:REFERENCE]+ELEMENT+ELEMENT...'
//! ```
//!
//! The first data element is the segment header. Trailing empty data elements
//! are not written.

use crate::element::Element;
use crate::error::{FintsError, FintsResult};
use fints_core::syntax::{
    self, BINARY_MARKER, DATA_ELEMENT_SEPARATOR, ESCAPE_CHARACTER, GROUP_SEPARATOR,
    SEGMENT_TERMINATOR,
};
use std::fmt;

/// Segment header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentHeader {
    /// Segment type, e.g. `HNHBK`
    pub type_id: String,
    /// Sequence number within the message
    pub number: u32,
    /// Segment version
    pub version: u32,
    /// Number of the segment this one refers to (responses only)
    pub reference: Option<u32>,
}

impl SegmentHeader {
    /// Create a new segment header without reference
    pub fn new(type_id: impl Into<String>, number: u32, version: u32) -> Self {
        Self {
            type_id: type_id.into(),
            number,
            version,
            reference: None,
        }
    }

    fn to_element(&self) -> Element {
        let mut items = vec![
            Element::text(self.type_id.as_str()),
            Element::text(self.number.to_string()),
            Element::text(self.version.to_string()),
        ];
        if let Some(reference) = self.reference {
            items.push(Element::text(reference.to_string()));
        }
        Element::group(items)
    }

    fn from_element(element: &Element) -> FintsResult<Self> {
        let items = element.items();
        if items.len() < 3 || items.len() > 4 {
            return Err(FintsError::Syntax(format!(
                "Segment header needs 3 or 4 items, got {}",
                items.len()
            )));
        }

        let type_id = items[0]
            .as_text()
            .ok_or_else(|| FintsError::Syntax("Segment header without type".to_string()))?;
        let number = parse_header_number(&items[1], "number")?;
        let version = parse_header_number(&items[2], "version")?;
        let reference = match items.get(3) {
            Some(item) => Some(parse_header_number(item, "reference")?),
            None => None,
        };

        Ok(Self {
            type_id: type_id.to_string(),
            number,
            version,
            reference,
        })
    }
}

fn parse_header_number(item: &Element, name: &str) -> FintsResult<u32> {
    item.as_text()
        .and_then(|text| text.parse::<u32>().ok())
        .ok_or_else(|| FintsError::Syntax(format!("Invalid segment header {}: {:?}", name, item)))
}

impl fmt::Display for SegmentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.type_id, self.number, self.version)?;
        if let Some(reference) = self.reference {
            write!(f, ":{}", reference)?;
        }
        Ok(())
    }
}

/// A FinTS segment: header plus ordered data elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    header: SegmentHeader,
    elements: Vec<Element>,
}

impl Segment {
    /// Create a new segment
    pub fn new(header: SegmentHeader, mut elements: Vec<Element>) -> Self {
        trim_trailing_empty(&mut elements);
        Self { header, elements }
    }

    /// Get the header
    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    /// Get the segment type
    pub fn type_id(&self) -> &str {
        &self.header.type_id
    }

    /// Get the sequence number
    pub fn number(&self) -> u32 {
        self.header.number
    }

    /// Set the sequence number
    pub fn set_number(&mut self, number: u32) {
        self.header.number = number;
    }

    /// Get the data elements (without header)
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get one data element; omitted trailing elements read as empty
    pub fn element(&self, index: usize) -> &Element {
        self.elements.get(index).unwrap_or(&Element::Empty)
    }

    /// Replace one data element
    pub fn set_element(&mut self, index: usize, element: Element) {
        if index >= self.elements.len() {
            self.elements.resize(index + 1, Element::Empty);
        }
        self.elements[index] = element;
        trim_trailing_empty(&mut self.elements);
    }

    /// Interpret a data element as a nested segment sequence
    ///
    /// Accepts both the in-memory form and a binary block as read from the wire.
    pub fn nested_segments(&self, index: usize) -> FintsResult<Vec<Segment>> {
        match self.element(index) {
            Element::Segments(segments) => Ok(segments.clone()),
            Element::Binary(data) => Segment::decode_all(data),
            Element::Empty => Ok(Vec::new()),
            other => Err(FintsError::Syntax(format!(
                "Element {} of {} is not a segment sequence: {:?}",
                index, self.header, other
            ))),
        }
    }

    /// Encode the segment to bytes
    pub fn encode(&self) -> FintsResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> FintsResult<()> {
        self.header.to_element().write(out)?;
        for element in &self.elements {
            out.push(DATA_ELEMENT_SEPARATOR);
            element.write(out)?;
        }
        out.push(SEGMENT_TERMINATOR);
        Ok(())
    }

    /// Decode exactly one segment
    pub fn decode(data: &[u8]) -> FintsResult<Self> {
        let mut segments = Self::decode_all(data)?;
        if segments.len() != 1 {
            return Err(FintsError::Syntax(format!(
                "Expected exactly one segment, got {}",
                segments.len()
            )));
        }
        Ok(segments.remove(0))
    }

    /// Decode a sequence of segments
    pub fn decode_all(data: &[u8]) -> FintsResult<Vec<Self>> {
        let mut reader = SegmentReader::new(data);
        let mut segments = Vec::new();
        while !reader.is_at_end() {
            segments.push(reader.read_segment()?);
        }
        Ok(segments)
    }
}

fn trim_trailing_empty(elements: &mut Vec<Element>) {
    while matches!(elements.last(), Some(Element::Empty)) {
        elements.pop();
    }
}

/// Delimiter that ended an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Group,
    DataElement,
    Segment,
}

/// Reader splitting wire bytes into segments
struct SegmentReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> SegmentReader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.buffer.len()
    }

    fn read_segment(&mut self) -> FintsResult<Segment> {
        let start = self.position;
        let mut data_elements = Vec::new();
        let mut items = Vec::new();

        loop {
            let (item, delimiter) = self.read_item().map_err(|e| match e {
                FintsError::Syntax(msg) => {
                    FintsError::Syntax(format!("{} (segment starting at byte {})", msg, start))
                }
                other => other,
            })?;
            items.push(item);
            match delimiter {
                Delimiter::Group => {}
                Delimiter::DataElement => {
                    data_elements.push(Element::group(std::mem::take(&mut items)));
                }
                Delimiter::Segment => {
                    data_elements.push(Element::group(std::mem::take(&mut items)));
                    break;
                }
            }
        }

        let mut data_elements = data_elements.into_iter();
        let header_element = data_elements.next().unwrap_or(Element::Empty);
        let header = SegmentHeader::from_element(&header_element)?;
        Ok(Segment::new(header, data_elements.collect()))
    }

    fn read_item(&mut self) -> FintsResult<(Element, Delimiter)> {
        if self.peek() == Some(BINARY_MARKER) {
            let data = self.read_binary()?;
            let delimiter = self.read_delimiter()?;
            return Ok((Element::Binary(data), delimiter));
        }

        let mut raw = Vec::new();
        loop {
            let byte = self.next_byte()?;
            match byte {
                ESCAPE_CHARACTER => raw.push(self.next_byte()?),
                GROUP_SEPARATOR => return Ok((text_item(&raw), Delimiter::Group)),
                DATA_ELEMENT_SEPARATOR => return Ok((text_item(&raw), Delimiter::DataElement)),
                SEGMENT_TERMINATOR => return Ok((text_item(&raw), Delimiter::Segment)),
                other => raw.push(other),
            }
        }
    }

    fn read_binary(&mut self) -> FintsResult<Vec<u8>> {
        self.position += 1;
        let length_start = self.position;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.position += 1;
        }
        let length_text = syntax::decode_latin1(&self.buffer[length_start..self.position]);
        if self.next_byte()? != BINARY_MARKER {
            return Err(FintsError::Syntax(format!(
                "Binary length prefix not terminated at byte {}",
                self.position - 1
            )));
        }
        let length: usize = length_text
            .parse()
            .map_err(|_| FintsError::Syntax(format!("Invalid binary length: {:?}", length_text)))?;

        let available = self.buffer.len() - self.position;
        if available < length {
            return Err(FintsError::Syntax(format!(
                "Binary element declares {} bytes, only {} available",
                length, available
            )));
        }
        let data = self.buffer[self.position..self.position + length].to_vec();
        self.position += length;
        Ok(data)
    }

    fn read_delimiter(&mut self) -> FintsResult<Delimiter> {
        match self.next_byte()? {
            GROUP_SEPARATOR => Ok(Delimiter::Group),
            DATA_ELEMENT_SEPARATOR => Ok(Delimiter::DataElement),
            SEGMENT_TERMINATOR => Ok(Delimiter::Segment),
            other => Err(FintsError::Syntax(format!(
                "Expected delimiter after binary element, got 0x{:02X}",
                other
            ))),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buffer.get(self.position).copied()
    }

    fn next_byte(&mut self) -> FintsResult<u8> {
        let byte = self
            .peek()
            .ok_or_else(|| FintsError::Syntax("Unterminated segment".to_string()))?;
        self.position += 1;
        Ok(byte)
    }
}

fn text_item(raw: &[u8]) -> Element {
    Element::text(syntax::decode_latin1(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_segment() {
        let segment = Segment::decode(b"HNHBS:5:1+2'").unwrap();
        assert_eq!(segment.type_id(), "HNHBS");
        assert_eq!(segment.number(), 5);
        assert_eq!(segment.header().version, 1);
        assert_eq!(segment.elements(), &[Element::text("2")]);
    }

    #[test]
    fn test_encode_decode_escaped_and_binary() {
        let segment = Segment::new(
            SegmentHeader::new("HKTST", 3, 1),
            vec![
                Element::text("a+b:c'd?e@f"),
                Element::Empty,
                Element::group(vec![Element::text("x"), Element::binary(b"@1@'+:?".to_vec())]),
            ],
        );
        let encoded = segment.encode().unwrap();
        assert_eq!(encoded, b"HKTST:3:1+a?+b?:c?'d??e?@f++x:@7@@1@'+:?'".to_vec());
        assert_eq!(Segment::decode(&encoded).unwrap(), segment);
    }

    #[test]
    fn test_header_with_reference() {
        let segment = Segment::decode(b"HIRMS:4:2:3+0020::OK'").unwrap();
        assert_eq!(segment.header().reference, Some(3));
        assert_eq!(segment.encode().unwrap(), b"HIRMS:4:2:3+0020::OK'".to_vec());
    }

    #[test]
    fn test_trailing_empty_elements_dropped() {
        let segment = Segment::decode(b"HNSHA:5:2+1234567++'").unwrap();
        assert_eq!(segment.elements().len(), 1);
        assert_eq!(segment.element(2), &Element::Empty);
        assert_eq!(segment.encode().unwrap(), b"HNSHA:5:2+1234567'".to_vec());
    }

    #[test]
    fn test_decode_multiple_segments() {
        let segments = Segment::decode_all(b"HKA:2:1+x'HKB:3:1+y'").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].type_id(), "HKB");
    }

    #[test]
    fn test_nested_segments_from_binary() {
        let inner = b"HKA:2:1+x'HKB:3:1+y'";
        let outer = Segment::new(
            SegmentHeader::new("HNVSD", 999, 1),
            vec![Element::binary(inner.to_vec())],
        );
        let nested = outer.nested_segments(0).unwrap();
        assert_eq!(nested, Segment::decode_all(inner).unwrap());
    }

    #[test]
    fn test_set_element_extends_and_trims() {
        let mut segment = Segment::new(SegmentHeader::new("HKTST", 1, 1), vec![]);
        segment.set_element(2, Element::text("z"));
        assert_eq!(segment.elements().len(), 3);
        segment.set_element(2, Element::Empty);
        assert!(segment.elements().is_empty());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(Segment::decode(b"HNHBS:5:1+2"), Err(FintsError::Syntax(_))));
        assert!(matches!(Segment::decode(b"HNHBS:x:1'"), Err(FintsError::Syntax(_))));
        assert!(matches!(Segment::decode(b"HKA:1:1+@9@abc'"), Err(FintsError::Syntax(_))));
        assert!(matches!(Segment::decode(b"HKA:1:1+@3@abcd'"), Err(FintsError::Syntax(_))));
        assert!(matches!(Segment::decode(b"HKA:1:1+ab?"), Err(FintsError::Syntax(_))));
    }
}
