use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use thiserror::Error;

use crate::imaging::domain::encoded_image::{BinaryImage, EncodedImage};

const DATA_SCHEME: &str = "data:";
const PAYLOAD_SEPARATOR: char = ',';

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("malformed encoded image: {0}")]
    Malformed(String),
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("payload of {0} characters is not a whole number of base64 quanta")]
    Length(usize),
}

impl TranscodeError {
    /// True for payload failures, as opposed to a broken header.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            TranscodeError::Decode(_) | TranscodeError::Length(_)
        )
    }
}

/// Converts a data URI into raw bytes for upload.
///
/// The value is split at the first `,`; the MIME type is read from the
/// `data:<mime>[;params]` header and the remainder is decoded as standard
/// padded base64. Pure and deterministic.
pub fn transcode(encoded: &EncodedImage) -> Result<BinaryImage, TranscodeError> {
    let (meta, payload) = encoded
        .as_str()
        .split_once(PAYLOAD_SEPARATOR)
        .ok_or_else(|| TranscodeError::Malformed("missing payload separator".into()))?;

    let mime = parse_mime(meta)?;
    if payload.len() % 4 != 0 {
        return Err(TranscodeError::Length(payload.len()));
    }

    // The engine rejects non-canonical padding, so a successful decode
    // always fills exactly the expected length.
    let mut bytes = Vec::with_capacity(expected_decoded_len(payload));
    BASE64_STANDARD.decode_vec(payload, &mut bytes)?;

    Ok(BinaryImage::new(bytes, mime))
}

fn parse_mime(meta: &str) -> Result<String, TranscodeError> {
    let rest = meta
        .get(..DATA_SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(DATA_SCHEME))
        .map(|_| &meta[DATA_SCHEME.len()..])
        .ok_or_else(|| TranscodeError::Malformed("missing data: scheme".into()))?;

    let mime = rest.split(';').next().unwrap_or_default().trim();
    if mime.is_empty() || !mime.contains('/') {
        return Err(TranscodeError::Malformed(format!(
            "invalid MIME type {mime:?}"
        )));
    }
    Ok(mime.to_string())
}

/// Byte count a padded base64 text of this length must decode to.
fn expected_decoded_len(payload: &str) -> usize {
    let padding = payload
        .as_bytes()
        .iter()
        .rev()
        .take(2)
        .take_while(|&&b| b == b'=')
        .count();
    (payload.len() / 4 * 3).saturating_sub(padding)
}
