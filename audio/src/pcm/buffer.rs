//! Playable floating-point audio buffers.

use super::Format;
use std::time::Duration;

/// Scale between signed 16-bit samples and the [-1.0, 1.0) float range.
pub const I16_SCALE: f32 = 32768.0;

/// A decoded, playable audio buffer.
///
/// Samples are interleaved when the format is stereo. Buffers produced by
/// [`decode_base64_pcm`](super::decode_base64_pcm) are always mono.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    format: Format,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Creates a buffer from float samples.
    pub fn new(format: Format, samples: Vec<f32>) -> Self {
        Self { format, samples }
    }

    /// Builds a buffer from little-endian signed 16-bit PCM bytes.
    ///
    /// A trailing odd byte is ignored.
    pub fn from_pcm16le(format: Format, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_SCALE)
            .collect();
        Self { format, samples }
    }

    /// Returns the buffer format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of sample frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels() as usize
    }

    /// Returns how long the buffer plays for.
    pub fn duration(&self) -> Duration {
        self.format.frames_duration(self.frames())
    }

    /// Converts the samples back into little-endian signed 16-bit PCM.
    pub fn to_pcm16le(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            let value = (sample * I16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pcm16le() {
        let bytes = [0x00, 0x40, 0x00, 0xC0, 0xFF, 0x7F];
        let buf = AudioBuffer::from_pcm16le(Format::MONO_24K, &bytes);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.samples()[0], 0.5);
        assert_eq!(buf.samples()[1], -0.5);
        assert_eq!(buf.samples()[2], 32767.0 / 32768.0);
    }

    #[test]
    fn test_odd_trailing_byte_ignored() {
        let buf = AudioBuffer::from_pcm16le(Format::MONO_24K, &[0x00, 0x40, 0x11]);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_pcm16le_round_trip_is_exact() {
        let bytes: Vec<u8> = [i16::MIN, -1, 0, 1, 1234, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let buf = AudioBuffer::from_pcm16le(Format::MONO_24K, &bytes);
        assert_eq!(buf.to_pcm16le(), bytes);
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer::new(Format::MONO_24K, vec![0.0; 12000]);
        assert_eq!(buf.duration(), Duration::from_millis(500));

        let stereo = AudioBuffer::new(Format::stereo(24000), vec![0.0; 12000]);
        assert_eq!(stereo.frames(), 6000);
        assert_eq!(stereo.duration(), Duration::from_millis(250));
    }
}
