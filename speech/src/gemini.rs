//! Google Gemini speech synthesizer.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatvoice_speech::{GeminiSynthesizer, GeminiTtsConfig, Synthesizer};
//!
//! let synthesizer = GeminiSynthesizer::new(GeminiTtsConfig {
//!     api_key: "AIza...".to_string(),
//!     ..Default::default()
//! })?;
//! let pcm_base64 = synthesizer.synthesize("Hello!").await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::sanitize::clean_for_speech;
use crate::tts::{Synthesizer, TTSError};

/// Default TTS model.
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
/// Default prebuilt voice.
pub const DEFAULT_VOICE: &str = "Kore";
/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini synthesizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiTtsConfig {
    /// API key for authentication
    pub api_key: String,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Prebuilt voice name
    #[serde(default = "default_voice")]
    pub voice: String,
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds, 0 for none
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_TTS_MODEL.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for GeminiTtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            voice: default_voice(),
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

/// Speech synthesizer backed by the Gemini `generateContent` endpoint.
pub struct GeminiSynthesizer {
    client: Client,
    config: GeminiTtsConfig,
}

impl GeminiSynthesizer {
    /// Creates a new Gemini synthesizer.
    pub fn new(config: GeminiTtsConfig) -> Result<Self, TTSError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiTtsConfig {
        &self.config
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl Synthesizer for GeminiSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<String, TTSError> {
        let text = clean_for_speech(text).ok_or(TTSError::EmptyText)?;
        debug!(chars = text.chars().count(), model = %self.config.model, "gemini: synthesize");

        let resp = self
            .client
            .post(self.api_url())
            .json(&self.request_body(&text))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = classify_failure(status, &body);
            if matches!(err, TTSError::RateLimited(_)) {
                warn!(%status, "gemini: quota exceeded, skipping audio");
            } else {
                warn!(%status, "gemini: synthesis failed");
            }
            return Err(err);
        }

        let body: GenerateResponse = resp.json().await?;
        extract_audio(body)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    data: String,
}

fn extract_audio(resp: GenerateResponse) -> Result<String, TTSError> {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.inline_data)
        .map(|d| d.data)
        .filter(|d| !d.is_empty())
        .ok_or(TTSError::NoAudio)
}

fn classify_failure(status: StatusCode, body: &str) -> TTSError {
    let lower = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("quota")
        || lower.contains("resource_exhausted")
    {
        TTSError::RateLimited(status.to_string())
    } else {
        TTSError::SynthesisFailed(format!("{status}: {body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> GeminiSynthesizer {
        GeminiSynthesizer::new(GeminiTtsConfig {
            api_key: "k123".to_string(),
            base_url: "https://example.test/v1beta/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let cfg: GeminiTtsConfig = serde_json::from_str(r#"{"api_key":"k"}"#).unwrap();
        assert_eq!(cfg.model, DEFAULT_TTS_MODEL);
        assert_eq!(cfg.voice, DEFAULT_VOICE);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout_secs, 0);
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            synthesizer().api_url(),
            "https://example.test/v1beta/models/gemini-2.5-flash-preview-tts:generateContent?key=k123"
        );
    }

    #[test]
    fn test_request_body() {
        let body = synthesizer().request_body("Hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
    }

    #[test]
    fn test_extract_audio() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [{ "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AAAA" } }]
                }
            }]
        }))
        .unwrap();
        assert_eq!(extract_audio(resp).unwrap(), "AAAA");
    }

    #[test]
    fn test_extract_audio_missing() {
        let resp: GenerateResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(extract_audio(resp), Err(TTSError::NoAudio)));

        let resp: GenerateResponse =
            serde_json::from_value(json!({ "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }] }))
                .unwrap();
        assert!(matches!(extract_audio(resp), Err(TTSError::NoAudio)));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            TTSError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, "Quota exceeded for metric"),
            TTSError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            TTSError::SynthesisFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        let result = synthesizer().synthesize("  ** ").await;
        assert!(matches!(result, Err(TTSError::EmptyText)));
    }
}
