//! TAN challenge decoders
//!
//! The bank returns the TAN challenge in one of two formats, selected by the
//! version of the `HITAN` response segment:
//!
//! - before version 6: text with an embedded HHD 1.3 code ([`hhd`])
//! - version 6 and later: a binary photoTAN image payload ([`phototan`])
//!
//! The two formats are never parsed by the same routine.

pub mod hhd;
pub mod phototan;

pub use hhd::{parse_hhd_challenge, parse_hhd_code, HhdChallenge, HhdCode};
pub use phototan::{decode_phototan_image, PhotoTanImage};

use crate::error::FintsResult;
use fints_core::syntax;

/// First `HITAN` version carrying binary image challenges
pub const PHOTOTAN_MIN_HITAN_VERSION: u32 = 6;

/// Format of a TAN challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeFormat {
    /// Text with embedded HHD 1.3 code
    Hhd13Text,
    /// Length-prefixed MIME type and image
    PhotoTanImage,
}

impl ChallengeFormat {
    pub fn for_hitan_version(version: u32) -> Self {
        if version >= PHOTOTAN_MIN_HITAN_VERSION {
            ChallengeFormat::PhotoTanImage
        } else {
            ChallengeFormat::Hhd13Text
        }
    }
}

/// Decoded TAN challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Text(HhdChallenge),
    Image(PhotoTanImage),
}

impl Challenge {
    /// Decode a challenge as delivered by a `HITAN` segment of the given version
    pub fn decode(hitan_version: u32, data: &[u8]) -> FintsResult<Self> {
        match ChallengeFormat::for_hitan_version(hitan_version) {
            ChallengeFormat::Hhd13Text => {
                Ok(Challenge::Text(parse_hhd_challenge(&syntax::decode_latin1(data))?))
            }
            ChallengeFormat::PhotoTanImage => Ok(Challenge::Image(decode_phototan_image(data)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_by_version() {
        assert_eq!(ChallengeFormat::for_hitan_version(3), ChallengeFormat::Hhd13Text);
        assert_eq!(ChallengeFormat::for_hitan_version(5), ChallengeFormat::Hhd13Text);
        assert_eq!(ChallengeFormat::for_hitan_version(6), ChallengeFormat::PhotoTanImage);
        assert_eq!(ChallengeFormat::for_hitan_version(7), ChallengeFormat::PhotoTanImage);
    }

    #[test]
    fn test_decode_dispatches() {
        let image = PhotoTanImage::new("image/png", vec![1, 2, 3]);
        let decoded = Challenge::decode(6, &image.encode().unwrap()).unwrap();
        assert_eq!(decoded, Challenge::Image(image));

        let text = Challenge::decode(3, b"CHLGTEXT0004Gr\xfc\xdf").unwrap();
        match text {
            Challenge::Text(challenge) => assert_eq!(challenge.text, "Grüß"),
            other => panic!("unexpected challenge {:?}", other),
        }
    }
}
