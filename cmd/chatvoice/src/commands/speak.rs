//! Speak command: stream a reply through the playback pipeline.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use chatvoice_cli::{Context, Output, OutputFormat, load_input};
use chatvoice_speech::{
    ChatMessage, DEFAULT_BASE_URL, DEFAULT_TTS_MODEL, DEFAULT_VOICE, GeminiSynthesizer, GeminiTtsConfig,
    MemoryMessageStore, MessageStore, PacedSink, PlayStart, PlaybackOutcome, PlaybackPath, PlayerConfig, Role,
    SpeechPlayer, message_id,
};

use super::{format_bytes, get_context, print_result, print_success, print_verbose, print_warning, require_output_file};
use crate::Cli;

/// Synthesize a reply and play it into a raw PCM file.
///
/// The reply comes from --text, or from a conversation file (-f) holding a
/// list of messages. Audio is written as 24kHz mono 16-bit PCM at playback
/// pace, so the command runs for as long as the reply takes to speak.
#[derive(Args)]
pub struct SpeakCommand {
    /// Text to speak instead of a conversation file
    #[arg(long)]
    text: Option<String>,

    /// Message id in the conversation (default: the last model reply)
    #[arg(long)]
    message: Option<String>,

    /// Prebuilt voice name
    #[arg(long)]
    voice: Option<String>,

    /// Speech model
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait for a chunk before giving up
    #[arg(long, default_value_t = 10.0)]
    chunk_wait: f64,

    /// Write the conversation, including cached audio, to this file
    #[arg(long)]
    save: Option<String>,
}

/// Conversation file layout: a bare list or a `messages` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Conversation {
    List(Vec<ChatMessage>),
    Document { messages: Vec<ChatMessage> },
}

impl Conversation {
    fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Conversation::List(messages) | Conversation::Document { messages } => messages,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeakSummary {
    message: String,
    path: &'static str,
    chunks: usize,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    synthesized: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<usize>,
    cached: bool,
    output: String,
    bytes: u64,
    size: String,
    duration_secs: f64,
}

impl SpeakCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        if ctx.api_key.is_empty() {
            anyhow::bail!("context '{}' has no api_key", ctx.name);
        }
        let chunk_wait = parse_chunk_wait(self.chunk_wait)?;
        let output_path = require_output_file(cli)?;
        let (messages, id) = self.load_messages(cli)?;
        let total_messages = messages.len();

        let tts = self.tts_config(&ctx);
        print_verbose(cli, &format!("Model: {}, voice: {}", tts.model, tts.voice));

        let store = Arc::new(MemoryMessageStore::from_conversation(messages));
        let synthesizer = Arc::new(GeminiSynthesizer::new(tts)?);
        let sink = Arc::new(PacedSink::new(File::create(output_path)?));
        let config = PlayerConfig {
            chunk_wait,
            ..Default::default()
        };
        let format = config.format;
        let player = Arc::new(SpeechPlayer::new(config, synthesizer, sink, store.clone()));

        let task = match player.play(&id)? {
            PlayStart::Playing(task) => task,
            PlayStart::Stopped => anyhow::bail!("playback stopped before it started"),
        };
        let path = task.path();
        let chunks = task.chunks().len();
        print_verbose(cli, &format!("Playing {} ({} chunks)", id, chunks));

        let interrupt = {
            let player = player.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    player.stop();
                }
            })
        };
        let (outcome, report) = task.join().await;
        interrupt.abort();

        let bytes = std::fs::metadata(output_path)?.len();
        let cached = store
            .message(&id)
            .is_some_and(|m| m.cached_audio().is_some());

        if let Some(save) = &self.save {
            save_conversation(&store, total_messages, save)?;
            print_success(&format!("Conversation saved to {}", save));
        }

        let summary = SpeakSummary {
            message: id,
            path: match path {
                PlaybackPath::Cached => "cached",
                PlaybackPath::Streaming => "streaming",
            },
            chunks,
            outcome: outcome_label(&outcome),
            synthesized: report.map(|r| r.filled),
            failed: report.map(|r| r.failed),
            cached,
            output: output_path.to_string(),
            bytes,
            size: format_bytes(bytes),
            duration_secs: format.duration(bytes).as_secs_f64(),
        };
        print_result(cli, &summary)?;

        if !outcome.is_finished() {
            print_warning(&format!("Playback did not finish: {}", summary.outcome));
        }
        Ok(())
    }

    fn load_messages(&self, cli: &Cli) -> anyhow::Result<(Vec<ChatMessage>, String)> {
        if let Some(text) = &self.text {
            return Ok((vec![ChatMessage::reply(text.as_str())], message_id(0)));
        }

        let path = cli
            .input
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("either --text or a conversation file (-f) is required"))?;
        let messages = load_input::<Conversation>(path)?.into_messages();

        let id = match &self.message {
            Some(id) => id.clone(),
            None => last_reply_id(&messages)
                .ok_or_else(|| anyhow::anyhow!("conversation has no model reply, use --message"))?,
        };
        Ok((messages, id))
    }

    fn tts_config(&self, ctx: &Context) -> GeminiTtsConfig {
        GeminiTtsConfig {
            api_key: ctx.api_key.clone(),
            model: pick(self.model.as_deref(), &ctx.model, DEFAULT_TTS_MODEL),
            voice: pick(self.voice.as_deref(), &ctx.voice, DEFAULT_VOICE),
            base_url: pick(None, &ctx.base_url, DEFAULT_BASE_URL),
            timeout_secs: ctx.timeout,
        }
    }
}

fn parse_chunk_wait(secs: f64) -> anyhow::Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(wait) => Ok(wait),
        Err(_) => anyhow::bail!("--chunk-wait must be a non-negative number of seconds, got {secs}"),
    }
}

/// Returns the id of the last model reply.
fn last_reply_id(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rposition(|m| m.role == Role::Model)
        .map(message_id)
}

/// Flag value, then context value, then the default.
fn pick(flag: Option<&str>, configured: &str, default: &str) -> String {
    match flag {
        Some(v) if !v.is_empty() => v.to_string(),
        _ if !configured.is_empty() => configured.to_string(),
        _ => default.to_string(),
    }
}

fn outcome_label(outcome: &PlaybackOutcome) -> String {
    match outcome {
        PlaybackOutcome::Completed { .. } => "completed".to_string(),
        PlaybackOutcome::Replayed => "replayed".to_string(),
        PlaybackOutcome::TimedOut { index } => format!("timed out waiting for chunk {index}"),
        PlaybackOutcome::Superseded => "stopped".to_string(),
        PlaybackOutcome::Failed { reason } => format!("failed: {reason}"),
    }
}

fn save_conversation(store: &MemoryMessageStore, count: usize, path: &str) -> anyhow::Result<()> {
    let messages: Vec<ChatMessage> = (0..count)
        .filter_map(|i| store.message(&message_id(i)))
        .collect();
    let json = Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    Output::new(OutputFormat::from_json_flag(json), Some(path.to_string())).write(&messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_layouts() {
        let list: Conversation = serde_yaml::from_str("- role: user\n  text: hi\n- text: hello").unwrap();
        let messages = list.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Model);

        let doc: Conversation =
            serde_json::from_str(r#"{"messages": [{"role": "model", "text": "hey"}]}"#).unwrap();
        assert_eq!(doc.into_messages()[0].text, "hey");
    }

    #[test]
    fn test_last_reply_id() {
        let messages = vec![
            ChatMessage::reply("first"),
            ChatMessage {
                role: Role::User,
                text: "question".to_string(),
                audio_data: None,
            },
            ChatMessage::reply("second"),
            ChatMessage {
                role: Role::User,
                text: "thanks".to_string(),
                audio_data: None,
            },
        ];
        assert_eq!(last_reply_id(&messages).as_deref(), Some("msg-2"));
        assert_eq!(last_reply_id(&messages[1..2]), None);
    }

    #[test]
    fn test_parse_chunk_wait() {
        assert_eq!(parse_chunk_wait(10.0).unwrap(), Duration::from_secs(10));
        assert_eq!(parse_chunk_wait(0.0).unwrap(), Duration::ZERO);
        assert!(parse_chunk_wait(1e30).is_err());
        assert!(parse_chunk_wait(-1.0).is_err());
        assert!(parse_chunk_wait(f64::NAN).is_err());
        assert!(parse_chunk_wait(f64::INFINITY).is_err());
    }

    #[test]
    fn test_pick_precedence() {
        assert_eq!(pick(Some("Puck"), "Zephyr", DEFAULT_VOICE), "Puck");
        assert_eq!(pick(None, "Zephyr", DEFAULT_VOICE), "Zephyr");
        assert_eq!(pick(Some(""), "", DEFAULT_VOICE), "Kore");
    }

    #[test]
    fn test_save_conversation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chat.json");
        let store = MemoryMessageStore::from_conversation(vec![ChatMessage::reply("hello")]);
        store.attach_audio("msg-0", "AAAA".to_string());

        save_conversation(&store, 1, path.to_str().unwrap()).unwrap();
        let saved: Vec<ChatMessage> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved[0].cached_audio(), Some("AAAA"));
    }
}
