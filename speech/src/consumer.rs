//! In-order playback of chunk audio.

use chatvoice_audio::pcm::{decode_base64_pcm, merge_base64_pcm};
use chatvoice_audio::{AudioBuffer, Format};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::session::{Session, SessionRegistry};
use crate::sink::AudioSink;
use crate::slot::{ChunkSlots, SlotAudio, SlotWait};
use crate::store::MessageStore;

/// How long the consumer waits for a chunk before giving up.
pub const DEFAULT_CHUNK_WAIT: Duration = Duration::from_secs(10);

/// How a playback attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every chunk played. `cached` is true if merged audio was attached to
    /// the message.
    Completed { chunks: usize, cached: bool },
    /// Cached audio played to its end.
    Replayed,
    /// Chunk `index` did not arrive in time.
    TimedOut { index: usize },
    /// A newer session took over.
    Superseded,
    /// Playback could not continue.
    Failed { reason: String },
}

impl PlaybackOutcome {
    /// Returns true if the audio played to its end.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Replayed)
    }
}

/// Plays a session's chunks in order as they become available.
pub struct PlaybackConsumer {
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn AudioSink>,
    store: Arc<dyn MessageStore>,
    format: Format,
    chunk_wait: Duration,
}

impl PlaybackConsumer {
    /// Creates a consumer decoding chunks as `format`.
    pub fn new(
        registry: Arc<SessionRegistry>,
        sink: Arc<dyn AudioSink>,
        store: Arc<dyn MessageStore>,
        format: Format,
        chunk_wait: Duration,
    ) -> Self {
        Self {
            registry,
            sink,
            store,
            format,
            chunk_wait,
        }
    }

    /// Plays every slot in order, waiting up to the chunk ceiling for each.
    ///
    /// After the last chunk the slots are merged and attached to the message
    /// if none of them is missing.
    pub async fn consume(&self, session: &Session, slots: &ChunkSlots) -> PlaybackOutcome {
        for index in 0..slots.len() {
            if !self.registry.is_current(session.id()) {
                return PlaybackOutcome::Superseded;
            }

            let audio = match slots.wait(index, self.chunk_wait, session.cancel_token()).await {
                SlotWait::Ready(audio) => audio,
                SlotWait::Cancelled => return PlaybackOutcome::Superseded,
                SlotWait::TimedOut => {
                    warn!(session = session.id(), index, "consumer: chunk timed out");
                    return match self.registry.with_current(session, |scope| scope.clear_indicators()) {
                        Some(()) => PlaybackOutcome::TimedOut { index },
                        None => PlaybackOutcome::Superseded,
                    };
                }
            };

            let buffer = match decode_base64_pcm(&audio, self.format) {
                Ok(buffer) => buffer,
                Err(e) => return self.fail(session, format!("chunk {index}: {e}")),
            };
            debug!(session = session.id(), index, duration = ?buffer.duration(), "consumer: play chunk");

            if let Err(outcome) = self.play_buffer(session, buffer).await {
                return outcome;
            }
        }

        self.complete(session, slots)
    }

    /// Plays already merged audio in one piece.
    pub async fn play_cached(&self, session: &Session, audio: &str) -> PlaybackOutcome {
        let buffer = match decode_base64_pcm(audio, self.format) {
            Ok(buffer) => buffer,
            Err(e) => return self.fail(session, format!("cached audio: {e}")),
        };
        debug!(session = session.id(), duration = ?buffer.duration(), "consumer: replay cached audio");

        if let Err(outcome) = self.play_buffer(session, buffer).await {
            return outcome;
        }
        match self.registry.with_current(session, |scope| {
            scope.set_playing(false);
            scope.clear_active();
        }) {
            Some(()) => PlaybackOutcome::Replayed,
            None => PlaybackOutcome::Superseded,
        }
    }

    /// Starts `buffer` and waits for it to end.
    ///
    /// The sink is started outside the registry lock since it may block. Its
    /// handle is registered under the lock, and stopped at once if `session`
    /// was superseded in between.
    async fn play_buffer(&self, session: &Session, buffer: AudioBuffer) -> Result<(), PlaybackOutcome> {
        if !self.registry.is_current(session.id()) {
            return Err(PlaybackOutcome::Superseded);
        }

        let playback = match self.sink.start(buffer) {
            Ok(playback) => playback,
            Err(e) => {
                error!(session = session.id(), error = %e, "consumer: sink failed to start");
                return Err(self.fail(session, format!("sink: {e}")));
            }
        };

        let handle = playback.handle.clone();
        let registered = self.registry.with_current(session, |scope| {
            scope.set_loading(false);
            scope.set_playing(true);
            scope.set_active(playback.handle);
        });
        if registered.is_none() {
            debug!(session = session.id(), "consumer: superseded while starting, stop");
            handle.stop();
            return Err(PlaybackOutcome::Superseded);
        }
        let finished = playback.finished;

        tokio::select! {
            _ = session.cancel_token().cancelled() => Err(PlaybackOutcome::Superseded),
            done = finished => match done {
                Ok(()) => Ok(()),
                Err(_) => Err(self.fail(session, "playback stopped".to_string())),
            },
        }
    }

    /// Merges the slots and attaches the result while `session` is still
    /// current.
    fn complete(&self, session: &Session, slots: &ChunkSlots) -> PlaybackOutcome {
        let parts: Option<Vec<SlotAudio>> = slots.snapshot().into_iter().collect();
        let merged = parts.filter(|p| !p.is_empty()).map(|p| merge_base64_pcm(&p));

        let current = self.registry.with_current(session, |scope| {
            scope.set_playing(false);
            scope.clear_active();
            merged.is_some_and(|audio| self.store.attach_audio(session.message_id(), audio))
        });
        let Some(cached) = current else {
            return PlaybackOutcome::Superseded;
        };
        debug!(session = session.id(), chunks = slots.len(), cached, "consumer: completed");

        PlaybackOutcome::Completed {
            chunks: slots.len(),
            cached,
        }
    }

    /// Clears the indicators and reports a failure, unless the session is
    /// already stale.
    fn fail(&self, session: &Session, reason: String) -> PlaybackOutcome {
        match self.registry.with_current(session, |scope| {
            scope.clear_indicators();
            scope.clear_active();
        }) {
            Some(()) => {
                warn!(session = session.id(), reason = %reason, "consumer: playback failed");
                PlaybackOutcome::Failed { reason }
            }
            None => PlaybackOutcome::Superseded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Playback, SinkError};
    use crate::store::{ChatMessage, MemoryMessageStore};
    use chatvoice_audio::pcm::encode_base64_pcm;

    struct SilentSink;

    impl AudioSink for SilentSink {
        fn start(&self, _buffer: AudioBuffer) -> Result<Playback, SinkError> {
            Err(SinkError::Closed)
        }
    }

    fn consumer(registry: &Arc<SessionRegistry>, store: &Arc<MemoryMessageStore>) -> PlaybackConsumer {
        PlaybackConsumer::new(
            registry.clone(),
            Arc::new(SilentSink),
            store.clone(),
            Format::MONO_24K,
            DEFAULT_CHUNK_WAIT,
        )
    }

    fn filled_slots() -> ChunkSlots {
        let slots = ChunkSlots::new(2);
        slots.fill(0, encode_base64_pcm(&[1, 0]));
        slots.fill(1, encode_base64_pcm(&[2, 0]));
        slots
    }

    #[test]
    fn test_complete_caches_for_current_session() {
        let registry = Arc::new(SessionRegistry::new());
        let store = Arc::new(MemoryMessageStore::from_conversation(vec![ChatMessage::reply("hi")]));
        let session = registry.begin("msg-0");

        let outcome = consumer(&registry, &store).complete(&session, &filled_slots());
        assert_eq!(outcome, PlaybackOutcome::Completed { chunks: 2, cached: true });
        assert_eq!(
            store.message("msg-0").unwrap().cached_audio(),
            Some(encode_base64_pcm(&[1, 0, 2, 0]).as_str())
        );
    }

    #[test]
    fn test_complete_skips_cache_for_stale_session() {
        let registry = Arc::new(SessionRegistry::new());
        let store = Arc::new(MemoryMessageStore::from_conversation(vec![ChatMessage::reply("hi")]));
        let stale = registry.begin("msg-0");
        registry.begin("msg-1");

        let outcome = consumer(&registry, &store).complete(&stale, &filled_slots());
        assert_eq!(outcome, PlaybackOutcome::Superseded);
        assert!(store.message("msg-0").unwrap().audio_data.is_none());
    }

    #[test]
    fn test_complete_with_missing_slot_does_not_cache() {
        let registry = Arc::new(SessionRegistry::new());
        let store = Arc::new(MemoryMessageStore::from_conversation(vec![ChatMessage::reply("hi")]));
        let session = registry.begin("msg-0");
        let slots = ChunkSlots::new(2);
        slots.fill(0, encode_base64_pcm(&[1, 0]));

        let outcome = consumer(&registry, &store).complete(&session, &slots);
        assert_eq!(outcome, PlaybackOutcome::Completed { chunks: 2, cached: false });
        assert!(store.message("msg-0").unwrap().audio_data.is_none());
    }
}
