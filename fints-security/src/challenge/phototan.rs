//! photoTAN challenge payload
//!
//! # Layout
//!
//! ```text
//! +---------+-----------+---------+------------+
//! | L1 (u16)| MIME type | L2 (u16)| image data |
//! +---------+-----------+---------+------------+
//! ```
//!
//! Both lengths are big-endian. The MIME type is ISO-8859-1 text.

use crate::error::{FintsError, FintsResult};
use bytes::{Buf, BufMut, BytesMut};
use fints_core::syntax;

/// Image challenge of a photoTAN transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoTanImage {
    pub mime_type: String,
    pub image: Vec<u8>,
}

impl PhotoTanImage {
    pub fn new(mime_type: impl Into<String>, image: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            image: image.into(),
        }
    }

    /// Encode into the length-prefixed challenge layout
    ///
    /// # Errors
    /// Returns invalid data if a part exceeds 65535 bytes or the MIME type is
    /// not ISO-8859-1.
    pub fn encode(&self) -> FintsResult<Vec<u8>> {
        let mime = syntax::encode_latin1(&self.mime_type)?;
        let mime_len = part_length("mime type", mime.len())?;
        let image_len = part_length("image", self.image.len())?;

        let mut buf = BytesMut::with_capacity(4 + mime.len() + self.image.len());
        buf.put_u16(mime_len);
        buf.put_slice(&mime);
        buf.put_u16(image_len);
        buf.put_slice(&self.image);
        Ok(buf.to_vec())
    }
}

fn part_length(field: &str, len: usize) -> FintsResult<u16> {
    u16::try_from(len).map_err(|_| {
        FintsError::InvalidData(format!("{} of {} bytes exceeds 65535 bytes", field, len))
    })
}

/// Decode a photoTAN challenge
///
/// # Errors
/// Returns [`FintsError::ChallengeTruncated`] if the buffer ends before a
/// length prefix or a declared part is complete.
pub fn decode_phototan_image(data: &[u8]) -> FintsResult<PhotoTanImage> {
    let mut buf = data;

    let mime_len = read_length(&mut buf, "mime type length")?;
    let mime = read_part(&mut buf, "mime type", mime_len)?;
    let image_len = read_length(&mut buf, "image length")?;
    let image = read_part(&mut buf, "image", image_len)?;

    if buf.has_remaining() {
        log::debug!("Ignoring {} bytes after photoTAN image", buf.remaining());
    }

    Ok(PhotoTanImage {
        mime_type: syntax::decode_latin1(&mime),
        image,
    })
}

fn read_length(buf: &mut &[u8], field: &'static str) -> FintsResult<usize> {
    if buf.remaining() < 2 {
        return Err(FintsError::ChallengeTruncated {
            field,
            expected: 2,
            available: buf.remaining(),
        });
    }
    Ok(usize::from(buf.get_u16()))
}

fn read_part(buf: &mut &[u8], field: &'static str, len: usize) -> FintsResult<Vec<u8>> {
    if buf.remaining() < len {
        return Err(FintsError::ChallengeTruncated {
            field,
            expected: len,
            available: buf.remaining(),
        });
    }
    let mut part = vec![0u8; len];
    buf.copy_to_slice(&mut part);
    Ok(part)
}
