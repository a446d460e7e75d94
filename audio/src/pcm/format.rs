//! PCM audio format definitions.

use std::time::Duration;

/// Describes a signed 16-bit PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz (e.g., 24000, 48000).
    pub sample_rate: u32,
    /// True for stereo (2 channels), false for mono (1 channel).
    pub stereo: bool,
}

impl Format {
    /// Creates a new format with the given sample rate and mono audio.
    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: false }
    }

    /// Creates a new format with the given sample rate and stereo audio.
    pub const fn stereo(sample_rate: u32) -> Self {
        Self { sample_rate, stereo: true }
    }

    /// Returns the number of channels (1 for mono, 2 for stereo).
    pub fn channels(&self) -> u32 {
        if self.stereo { 2 } else { 1 }
    }

    /// Returns the number of bytes per sample frame.
    /// For 16-bit audio: 2 bytes for mono, 4 bytes for stereo.
    pub fn sample_bytes(&self) -> usize {
        if self.stereo { 4 } else { 2 }
    }

    /// Returns the number of bytes per second of audio.
    pub fn bytes_rate(&self) -> u64 {
        self.sample_rate as u64 * self.sample_bytes() as u64
    }

    /// Returns the playback duration of `frames` sample frames.
    pub fn frames_duration(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Returns the playback duration of `bytes` bytes of PCM data.
    pub fn duration(&self, bytes: u64) -> Duration {
        self.frames_duration((bytes / self.sample_bytes() as u64) as usize)
    }

    /// Returns the number of PCM bytes needed for `duration`, rounded down to whole frames.
    pub fn bytes_in_duration(&self, duration: Duration) -> u64 {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64) as u64;
        frames * self.sample_bytes() as u64
    }
}

// Common format presets
impl Format {
    /// 16kHz mono
    pub const MONO_16K: Format = Format::mono(16000);
    /// 24kHz mono, the output format of the speech synthesizer
    pub const MONO_24K: Format = Format::mono(24000);
    /// 48kHz mono
    pub const MONO_48K: Format = Format::mono(48000);
}

impl Default for Format {
    fn default() -> Self {
        Self::MONO_24K
    }
}
