//! Data elements of a segment
//!
//! An [`Element`] is what sits between two `+` separators. Groups are flat on
//! the wire: a group nested inside a group contributes its items in place, so
//! [`Element::group`] flattens eagerly. Trailing empty items are not written,
//! and a group left with a single item is that item. Constructing elements
//! through [`Element::text`] and [`Element::group`] therefore yields the same
//! value the parser produces for the same wire text.

use crate::error::FintsResult;
use crate::segment::Segment;
use fints_core::syntax::{self, GROUP_SEPARATOR};

/// One data element of a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Omitted element
    Empty,
    /// Text, stored unescaped
    Text(String),
    /// Binary data, written as `@len@bytes`
    Binary(Vec<u8>),
    /// Data element group, at least two items, none of them a group
    Group(Vec<Element>),
    /// Nested segment sequence, written as one binary block
    Segments(Vec<Segment>),
}

impl Element {
    /// Create a text element; empty text is an omitted element
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Element::Empty
        } else {
            Element::Text(value)
        }
    }

    /// Create a binary element
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Element::Binary(value.into())
    }

    /// Create a data element group in canonical form
    pub fn group(items: Vec<Element>) -> Self {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Element::Group(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        while matches!(flat.last(), Some(Element::Empty)) {
            flat.pop();
        }
        match flat.len() {
            0 => Element::Empty,
            1 => flat.pop().unwrap_or(Element::Empty),
            _ => Element::Group(flat),
        }
    }

    /// Check whether this element is omitted
    pub fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }

    /// Get the items of this element as a flat list
    ///
    /// A scalar element is a one-item list, an omitted element has no items.
    pub fn items(&self) -> &[Element] {
        match self {
            Element::Empty => &[],
            Element::Group(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Get the text of a text element
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Element::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Write the element in wire form
    pub(crate) fn write(&self, out: &mut Vec<u8>) -> FintsResult<()> {
        match self {
            Element::Group(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(GROUP_SEPARATOR);
                    }
                    item.write(out)?;
                }
                Ok(())
            }
            Element::Empty => Ok(()),
            Element::Text(text) => syntax::write_escaped(text, out),
            Element::Binary(data) => {
                syntax::write_binary(data, out);
                Ok(())
            }
            Element::Segments(segments) => {
                let mut nested = Vec::new();
                for segment in segments {
                    segment.write(&mut nested)?;
                }
                syntax::write_binary(&nested, out);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(element: &Element) -> Vec<u8> {
        let mut out = Vec::new();
        element.write(&mut out).unwrap();
        out
    }

    #[test]
    fn test_group_flattens_and_trims() {
        let group = Element::group(vec![
            Element::group(vec![Element::text("280"), Element::text("12345678")]),
            Element::text("user"),
            Element::Empty,
            Element::Empty,
        ]);
        assert_eq!(
            group,
            Element::Group(vec![
                Element::text("280"),
                Element::text("12345678"),
                Element::text("user"),
            ])
        );
        assert_eq!(render(&group), b"280:12345678:user".to_vec());
    }

    #[test]
    fn test_group_collapses() {
        assert_eq!(Element::group(vec![Element::text("pin"), Element::Empty]), Element::text("pin"));
        assert_eq!(Element::group(vec![Element::Empty]), Element::Empty);
        assert_eq!(Element::text(""), Element::Empty);
    }

    #[test]
    fn test_inner_empty_items_kept() {
        let group = Element::group(vec![Element::text("1"), Element::Empty, Element::text("SYS")]);
        assert_eq!(render(&group), b"1::SYS".to_vec());
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render(&Element::text("a:b")), b"a?:b".to_vec());
    }

    #[test]
    fn test_items() {
        assert!(Element::Empty.items().is_empty());
        assert_eq!(Element::text("x").items().len(), 1);
    }
}
