//! HHD 1.3 textual challenge
//!
//! Older `HITAN` versions embed the flicker code inside the challenge text:
//!
//! ```text
//! CHLGUC  0031 29 08 88134473 10 1234567890 05 15,00 CHLGTEXT 0292 Sie haben ...
//!        ^len  LC LS start     LDE data       LDE data          ^len text
//! ```
//!
//! (spaces added for readability). The code is a sequence of two-digit
//! length prefixes: `LC` for the whole remainder, `LS` for the start code and
//! one `LDE` per data element.
//!
//! Banks also put other code formats behind the same marker (HHD 1.4 with a
//! three-digit `LC`, base64 matrix codes). Those are kept as raw text only.

use crate::error::{FintsError, FintsResult};

const CODE_MARKER: &str = "CHLGUC ";
const TEXT_MARKER: &str = "CHLGTEXT";
const MARKER_HEADER_LENGTH: usize = 12;

/// Challenge text with its optional embedded code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HhdChallenge {
    /// Code as cut out behind the `CHLGUC` marker
    pub raw_code: Option<String>,
    /// Structured code, if `raw_code` is HHD 1.3
    pub code: Option<HhdCode>,
    pub text: String,
}

/// Flicker code of an HHD 1.3 challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HhdCode {
    /// Code as embedded in the challenge
    pub raw: String,
    pub start_code: String,
    /// Data elements, e.g. account number and amount
    pub data_elements: Vec<String>,
}

/// Parse an HHD 1.3 challenge text
///
/// Text without the `CHLGUC` marker is returned unchanged and without a code.
/// A code that is not HHD 1.3 is kept in `raw_code` with `code` left empty.
///
/// # Errors
/// Returns a syntax error if the length behind `CHLGUC` is not numeric or
/// exceeds the available text.
pub fn parse_hhd_challenge(challenge: &str) -> FintsResult<HhdChallenge> {
    let mut raw_code = None;
    let mut code = None;
    let mut rest = challenge;

    if rest.starts_with(CODE_MARKER) {
        let length = rest
            .get(MARKER_HEADER_LENGTH - 4..MARKER_HEADER_LENGTH)
            .ok_or_else(|| truncated("code length"))?;
        let length = parse_length(length)?;
        let body = &rest[MARKER_HEADER_LENGTH..];
        let (raw, tail) = split_chars(body, length).ok_or_else(|| truncated("code"))?;
        code = match parse_hhd_code(raw) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::debug!("Keeping challenge code as raw text: {}", e);
                None
            }
        };
        raw_code = Some(raw.to_string());
        rest = tail;
    }

    let text = if rest.starts_with(TEXT_MARKER) {
        rest.get(MARKER_HEADER_LENGTH..).unwrap_or_default()
    } else {
        rest
    };

    Ok(HhdChallenge {
        raw_code,
        code,
        text: text.to_string(),
    })
}

/// Parse the flicker code itself (`LC LS start (LDE data)*`)
pub fn parse_hhd_code(raw: &str) -> FintsResult<HhdCode> {
    let mut cursor = raw;
    let declared = take_length(&mut cursor, "LC")?;
    if declared != cursor.chars().count() {
        return Err(FintsError::Syntax(format!(
            "HHD code declares {} characters, {} present",
            declared,
            cursor.chars().count()
        )));
    }

    let start_length = take_length(&mut cursor, "LS")?;
    let start_code = take_chars(&mut cursor, start_length, "start code")?;

    let mut data_elements = Vec::new();
    while !cursor.is_empty() {
        let length = take_length(&mut cursor, "LDE")?;
        data_elements.push(take_chars(&mut cursor, length, "data element")?);
    }

    Ok(HhdCode {
        raw: raw.to_string(),
        start_code,
        data_elements,
    })
}

fn truncated(what: &str) -> FintsError {
    FintsError::Syntax(format!("HHD challenge ends inside the {}", what))
}

fn parse_length(digits: &str) -> FintsResult<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FintsError::Syntax(format!("HHD length {:?} is not numeric", digits)));
    }
    digits
        .parse()
        .map_err(|_| FintsError::Syntax(format!("HHD length {:?} is out of range", digits)))
}

fn split_chars(text: &str, count: usize) -> Option<(&str, &str)> {
    if count == 0 {
        return Some(("", text));
    }
    let (index, c) = text.char_indices().nth(count - 1)?;
    Some(text.split_at(index + c.len_utf8()))
}

fn take_length(cursor: &mut &str, what: &str) -> FintsResult<usize> {
    let (digits, rest) = split_chars(cursor, 2).ok_or_else(|| truncated(what))?;
    let length = parse_length(digits)?;
    *cursor = rest;
    Ok(length)
}

fn take_chars(cursor: &mut &str, count: usize, what: &str) -> FintsResult<String> {
    let (value, rest) = split_chars(cursor, count).ok_or_else(|| truncated(what))?;
    *cursor = rest;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGE: &str =
        "CHLGUC  00312908881344731012345678900515,00CHLGTEXT0292Sie haben eine Überweisung beauftragt";

    #[test]
    fn test_parse_embedded_code() {
        let parsed = parse_hhd_challenge(CHALLENGE).unwrap();
        assert_eq!(parsed.raw_code.as_deref(), Some("2908881344731012345678900515,00"));
        let code = parsed.code.unwrap();
        assert_eq!(code.raw, "2908881344731012345678900515,00");
        assert_eq!(code.start_code, "88134473");
        assert_eq!(code.data_elements, vec!["1234567890", "15,00"]);
        assert_eq!(parsed.text, "Sie haben eine Überweisung beauftragt");
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse_hhd_challenge("Bitte TAN eingeben").unwrap();
        assert!(parsed.raw_code.is_none());
        assert!(parsed.code.is_none());
        assert_eq!(parsed.text, "Bitte TAN eingeben");
    }

    #[test]
    fn test_text_marker_without_code() {
        let parsed = parse_hhd_challenge("CHLGTEXT0005Hallo").unwrap();
        assert!(parsed.code.is_none());
        assert_eq!(parsed.text, "Hallo");
    }

    #[test]
    fn test_hhd14_code_keeps_text() {
        // Three-digit LC
        let raw = "02908881344731012345678900515,00";
        let challenge = format!("CHLGUC  0032{}CHLGTEXT0009Bitte TAN", raw);
        let parsed = parse_hhd_challenge(&challenge).unwrap();
        assert_eq!(parsed.raw_code.as_deref(), Some(raw));
        assert!(parsed.code.is_none());
        assert_eq!(parsed.text, "Bitte TAN");
    }

    #[test]
    fn test_matrix_code_keeps_text() {
        let parsed = parse_hhd_challenge("CHLGUC  0008iVBORw0KCHLGTEXT0005Hallo").unwrap();
        assert_eq!(parsed.raw_code.as_deref(), Some("iVBORw0K"));
        assert!(parsed.code.is_none());
        assert_eq!(parsed.text, "Hallo");
    }

    #[test]
    fn test_code_length_beyond_text() {
        assert!(matches!(
            parse_hhd_challenge("CHLGUC  0040290888"),
            Err(FintsError::Syntax(_))
        ));
        assert!(matches!(parse_hhd_challenge("CHLGUC  00x1"), Err(FintsError::Syntax(_))));
    }

    #[test]
    fn test_code_with_bad_inner_length() {
        assert!(matches!(parse_hhd_code("05081234"), Err(FintsError::Syntax(_))));
        assert!(matches!(parse_hhd_code("0508123"), Err(FintsError::Syntax(_))));
    }
}
