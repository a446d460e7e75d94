//! Base64 PCM payload codec.
//!
//! Speech synthesizers return raw signed 16-bit little-endian PCM as a
//! standard base64 string. This module turns such payloads into playable
//! buffers and concatenates several payloads into one.

use super::{AudioBuffer, Format};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::warn;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decodes a base64 PCM payload into raw bytes, truncated to an even length.
pub fn decode_pcm_bytes(data: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = STANDARD.decode(data.trim())?;
    let even = bytes.len() - bytes.len() % 2;
    bytes.truncate(even);
    Ok(bytes)
}

/// Decodes a base64 PCM payload into a playable buffer of the given format.
pub fn decode_base64_pcm(data: &str, format: Format) -> Result<AudioBuffer, CodecError> {
    let bytes = decode_pcm_bytes(data)?;
    Ok(AudioBuffer::from_pcm16le(format, &bytes))
}

/// Encodes raw PCM bytes as a base64 payload.
pub fn encode_base64_pcm(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Concatenates base64 PCM payloads into a single payload.
///
/// Empty parts are skipped. Any decode failure is returned.
pub fn try_merge_base64_pcm<S: AsRef<str>>(parts: &[S]) -> Result<String, CodecError> {
    match parts {
        [] => return Ok(String::new()),
        [only] => return Ok(only.as_ref().to_string()),
        _ => {}
    }

    let mut combined = Vec::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        combined.extend(STANDARD.decode(part.trim())?);
    }
    Ok(STANDARD.encode(combined))
}

/// Concatenates base64 PCM payloads into a single payload.
///
/// A single part is returned unchanged and no parts yield an empty string.
/// If any part fails to decode, the first part is returned on its own.
pub fn merge_base64_pcm<S: AsRef<str>>(parts: &[S]) -> String {
    match try_merge_base64_pcm(parts) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(parts = parts.len(), error = %e, "pcm: merge failed, keeping first part");
            parts
                .first()
                .map(|p| p.as_ref().to_string())
                .unwrap_or_default()
        }
    }
}
