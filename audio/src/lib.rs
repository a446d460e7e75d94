//! Audio utilities for speech playback.
//!
//! - `pcm`: 16-bit PCM formats, playable float buffers and the base64 PCM codec

pub mod pcm;

pub use pcm::{AudioBuffer, Format};
