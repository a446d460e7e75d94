//! PCM (Pulse Code Modulation) audio handling.
//!
//! # Key Types
//!
//! - [`Format`]: Sample rate and channel layout of a 16-bit PCM stream
//! - [`AudioBuffer`]: Decoded float samples ready for playback
//! - [`decode_base64_pcm`] / [`merge_base64_pcm`]: The base64 payload codec
//!
//! # Example
//!
//! ```rust
//! use chatvoice_audio::pcm::{Format, decode_base64_pcm, encode_base64_pcm, merge_base64_pcm};
//!
//! let a = encode_base64_pcm(&[0x00, 0x40]);
//! let b = encode_base64_pcm(&[0x00, 0xC0]);
//! let merged = merge_base64_pcm(&[a, b]);
//!
//! let buffer = decode_base64_pcm(&merged, Format::MONO_24K).unwrap();
//! assert_eq!(buffer.samples(), &[0.5, -0.5]);
//! ```

mod buffer;
mod codec;
mod format;

pub use buffer::{AudioBuffer, I16_SCALE};
pub use codec::{
    CodecError, decode_base64_pcm, decode_pcm_bytes, encode_base64_pcm, merge_base64_pcm,
    try_merge_base64_pcm,
};
pub use format::Format;
