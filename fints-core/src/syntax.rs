//! FinTS wire syntax
//!
//! A message is a sequence of segments. Each segment is a list of data
//! elements separated by `+`, the items of a data element group are separated
//! by `:` and every segment ends with `'`. A literal occurrence of one of the
//! reserved characters inside text is escaped with `?`.
//!
//! Binary data is written as `@<length>@<bytes>`. The length prefix lets a
//! reader skip over the raw bytes without looking at them, so binary payloads
//! never need escaping.
//!
//! Text on the wire is ISO-8859-1, one byte per character.

use crate::error::{FintsError, FintsResult};

/// Separates the data elements of a segment
pub const DATA_ELEMENT_SEPARATOR: u8 = b'+';

/// Separates the items of a data element group
pub const GROUP_SEPARATOR: u8 = b':';

/// Terminates a segment
pub const SEGMENT_TERMINATOR: u8 = b'\'';

/// Escapes the following reserved character
pub const ESCAPE_CHARACTER: u8 = b'?';

/// Opens and closes the length prefix of a binary element
pub const BINARY_MARKER: u8 = b'@';

/// Check whether a byte must be escaped inside text
pub fn is_reserved(byte: u8) -> bool {
    matches!(
        byte,
        DATA_ELEMENT_SEPARATOR | GROUP_SEPARATOR | SEGMENT_TERMINATOR | ESCAPE_CHARACTER | BINARY_MARKER
    )
}

/// Escape every reserved character in `text`
///
/// # Examples
///
/// ```
/// use fints_core::syntax::escape;
///
/// assert_eq!(escape("a+b:c'd?e@f"), "a?+b?:c?'d??e?@f");
/// ```
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() && is_reserved(c as u8) {
            escaped.push(ESCAPE_CHARACTER as char);
        }
        escaped.push(c);
    }
    escaped
}

/// Reverse [`escape`]
///
/// # Errors
/// Returns a syntax error if the text ends with a dangling escape character.
pub fn unescape(text: &str) -> FintsResult<String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE_CHARACTER as char {
            match chars.next() {
                Some(next) => unescaped.push(next),
                None => {
                    return Err(FintsError::Syntax(
                        "dangling escape character at end of text".to_string(),
                    ));
                }
            }
        } else {
            unescaped.push(c);
        }
    }
    Ok(unescaped)
}

/// Encode text as ISO-8859-1 and escape reserved characters, appending to `out`
///
/// # Errors
/// Returns invalid data if a character lies outside ISO-8859-1.
pub fn write_escaped(text: &str, out: &mut Vec<u8>) -> FintsResult<()> {
    for c in text.chars() {
        let byte = latin1_byte(c)?;
        if is_reserved(byte) {
            out.push(ESCAPE_CHARACTER);
        }
        out.push(byte);
    }
    Ok(())
}

/// Encode text as ISO-8859-1 without escaping
pub fn encode_latin1(text: &str) -> FintsResult<Vec<u8>> {
    text.chars().map(latin1_byte).collect()
}

/// Decode ISO-8859-1 bytes; every byte is a valid character
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn latin1_byte(c: char) -> FintsResult<u8> {
    u8::try_from(u32::from(c)).map_err(|_| {
        FintsError::InvalidData(format!(
            "character {:?} (U+{:04X}) cannot be encoded in ISO-8859-1",
            c,
            u32::from(c)
        ))
    })
}

/// Write a binary element as `@<length>@<bytes>`
pub fn write_binary(data: &[u8], out: &mut Vec<u8>) {
    out.push(BINARY_MARKER);
    out.extend_from_slice(data.len().to_string().as_bytes());
    out.push(BINARY_MARKER);
    out.extend_from_slice(data);
}
