//! Text-to-speech synthesis.

use async_trait::async_trait;
use std::sync::Arc;

/// Error type for TTS operations.
///
/// Every variant is a non-fatal outcome for playback: the chunk is left
/// without audio.
#[derive(Debug, thiserror::Error)]
pub enum TTSError {
    #[error("nothing to synthesize after cleaning")]
    EmptyText,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("response carried no audio")]
    NoAudio,
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Interface for a text-to-speech synthesizer.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `text` into a base64 payload of 16-bit mono PCM.
    async fn synthesize(&self, text: &str) -> Result<String, TTSError>;
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str) -> Result<String, TTSError> {
        (**self).synthesize(text).await
    }
}

#[cfg(test)]
mod tts_tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Synthesizer for Echo {
        async fn synthesize(&self, text: &str) -> Result<String, TTSError> {
            if text.is_empty() {
                return Err(TTSError::EmptyText);
            }
            Ok(text.to_string())
        }
    }

    #[test]
    fn test_tts_error_display() {
        let err = TTSError::RateLimited("429".to_string());
        assert!(err.to_string().contains("429"));

        let err = TTSError::SynthesisFailed("timeout".to_string());
        assert!(err.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn test_arc_forwards() {
        let syn: Arc<dyn Synthesizer> = Arc::new(Echo);
        assert_eq!(syn.synthesize("abc").await.unwrap(), "abc");
        assert!(matches!(syn.synthesize("").await, Err(TTSError::EmptyText)));
    }
}
