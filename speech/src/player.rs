//! Playback entry point for chat replies.
//!
//! [`SpeechPlayer::play`] is what a speaker button calls. It toggles playback
//! off when the message is already sounding, replays cached audio when the
//! message has some, and otherwise splits the text into chunks that are
//! synthesized in the background while earlier chunks play.

use chatvoice_audio::Format;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::chunker::TextChunker;
use crate::consumer::{DEFAULT_CHUNK_WAIT, PlaybackConsumer, PlaybackOutcome};
use crate::producer::{ProduceReport, SpeechProducer};
use crate::session::{Begin, Indicators, Session, SessionId, SessionRegistry};
use crate::sink::AudioSink;
use crate::slot::ChunkSlots;
use crate::store::MessageStore;
use crate::tts::Synthesizer;

/// Error type for the player.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("message not found: {0}")]
    MessageNotFound(String),
}

/// Player settings.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub chunker: TextChunker,
    /// Format of synthesized and cached audio.
    pub format: Format,
    /// Ceiling on waiting for a single chunk.
    pub chunk_wait: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            chunker: TextChunker::default(),
            format: Format::MONO_24K,
            chunk_wait: DEFAULT_CHUNK_WAIT,
        }
    }
}

/// Which path a playback took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPath {
    /// Merged audio was already attached to the message.
    Cached,
    /// Chunks are synthesized and played as they arrive.
    Streaming,
}

/// Result of [`SpeechPlayer::play`].
#[derive(Debug)]
pub enum PlayStart {
    /// The message was playing and has been stopped.
    Stopped,
    /// A new playback is running.
    Playing(PlaybackTask),
}

/// A running playback.
#[derive(Debug)]
pub struct PlaybackTask {
    session: Session,
    path: PlaybackPath,
    chunks: Vec<String>,
    slots: Option<Arc<ChunkSlots>>,
    consumer: JoinHandle<PlaybackOutcome>,
    producer: Option<JoinHandle<ProduceReport>>,
}

impl PlaybackTask {
    /// Returns the session id of this playback.
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Returns the message being played.
    pub fn message_id(&self) -> &str {
        self.session.message_id()
    }

    pub fn path(&self) -> PlaybackPath {
        self.path
    }

    /// Returns the chunks being synthesized. Empty on the cached path.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Returns the chunk slots. `None` on the cached path.
    pub fn slots(&self) -> Option<&ChunkSlots> {
        self.slots.as_deref()
    }

    /// Waits for playback to end.
    pub async fn finished(self) -> PlaybackOutcome {
        self.join().await.0
    }

    /// Waits for playback to end, and for the producer if there is one.
    pub async fn join(self) -> (PlaybackOutcome, Option<ProduceReport>) {
        let outcome = match self.consumer.await {
            Ok(outcome) => outcome,
            Err(e) => PlaybackOutcome::Failed {
                reason: format!("consumer task: {e}"),
            },
        };
        let report = match self.producer {
            Some(producer) => producer.await.ok(),
            None => None,
        };
        (outcome, report)
    }
}

/// Plays chat replies through a synthesizer and an audio sink.
///
/// Must be used from within a tokio runtime.
pub struct SpeechPlayer {
    config: PlayerConfig,
    registry: Arc<SessionRegistry>,
    producer: Arc<SpeechProducer>,
    consumer: Arc<PlaybackConsumer>,
    store: Arc<dyn MessageStore>,
}

impl SpeechPlayer {
    /// Creates a player.
    pub fn new(
        config: PlayerConfig,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Arc<dyn AudioSink>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let producer = Arc::new(SpeechProducer::new(registry.clone(), synthesizer));
        let consumer = Arc::new(PlaybackConsumer::new(
            registry.clone(),
            sink,
            store.clone(),
            config.format,
            config.chunk_wait,
        ));
        Self {
            config,
            registry,
            producer,
            consumer,
            store,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Returns the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns the current indicators.
    pub fn indicators(&self) -> Indicators {
        self.registry.indicators()
    }

    /// Subscribes to indicator changes.
    pub fn subscribe(&self) -> watch::Receiver<Indicators> {
        self.registry.subscribe()
    }

    /// Stops playback and invalidates the current session.
    pub fn stop(&self) {
        self.registry.stop();
    }

    /// Plays a message, or stops it if it is the one playing.
    pub fn play(&self, message_id: &str) -> Result<PlayStart, PlayerError> {
        let message = self
            .store
            .message(message_id)
            .ok_or_else(|| PlayerError::MessageNotFound(message_id.to_string()))?;

        let session = match self.registry.request(message_id) {
            Begin::Stopped => {
                info!(message = %message_id, "player: stopped");
                return Ok(PlayStart::Stopped);
            }
            Begin::Started(session) => session,
        };

        if let Some(audio) = message.cached_audio() {
            debug!(session = session.id(), message = %message_id, "player: cached path");
            let audio = audio.to_string();
            let consumer = self.consumer.clone();
            let ticket = session.clone();
            let handle = tokio::spawn(async move { consumer.play_cached(&ticket, &audio).await });
            return Ok(PlayStart::Playing(PlaybackTask {
                session,
                path: PlaybackPath::Cached,
                chunks: Vec::new(),
                slots: None,
                consumer: handle,
                producer: None,
            }));
        }

        let chunks = self.config.chunker.chunk(&message.text);
        let slots = Arc::new(ChunkSlots::new(chunks.len()));
        self.registry.with_current(&session, |scope| scope.set_loading(true));
        debug!(
            session = session.id(),
            message = %message_id,
            chunks = chunks.len(),
            "player: streaming path"
        );

        let producer = {
            let producer = self.producer.clone();
            let ticket = session.clone();
            let chunks = chunks.clone();
            let slots = slots.clone();
            tokio::spawn(async move { producer.produce(&ticket, &chunks, &slots).await })
        };
        let consumer = {
            let consumer = self.consumer.clone();
            let ticket = session.clone();
            let slots = slots.clone();
            tokio::spawn(async move { consumer.consume(&ticket, &slots).await })
        };

        Ok(PlayStart::Playing(PlaybackTask {
            session,
            path: PlaybackPath::Streaming,
            chunks,
            slots: Some(slots),
            consumer,
            producer: Some(producer),
        }))
    }
}
