//! Background synthesis of chunk audio.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::session::{Session, SessionRegistry};
use crate::slot::ChunkSlots;
use crate::tts::Synthesizer;

/// What a production run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProduceReport {
    /// Slots that received audio.
    pub filled: usize,
    /// Chunks whose synthesis failed.
    pub failed: usize,
    /// True if the run stopped because its session was superseded.
    pub superseded: bool,
}

/// Synthesizes chunks one after another into a session's slots.
pub struct SpeechProducer {
    registry: Arc<SessionRegistry>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl SpeechProducer {
    /// Creates a producer.
    pub fn new(registry: Arc<SessionRegistry>, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self { registry, synthesizer }
    }

    /// Synthesizes `chunks` in order, storing each result in `slots`.
    ///
    /// Requests are sequential to stay under upstream rate limits. A failed
    /// chunk, or one answered with an empty payload, leaves its slot empty
    /// and is not retried. The run stops as soon
    /// as `session` is superseded, and no slot is written after that.
    pub async fn produce(&self, session: &Session, chunks: &[String], slots: &ChunkSlots) -> ProduceReport {
        let mut report = ProduceReport::default();

        for (index, chunk) in chunks.iter().enumerate() {
            if !self.registry.is_current(session.id()) {
                report.superseded = true;
                break;
            }

            let result = tokio::select! {
                _ = session.cancel_token().cancelled() => {
                    report.superseded = true;
                    break;
                }
                result = self.synthesizer.synthesize(chunk) => result,
            };

            match result {
                Ok(audio) if audio.is_empty() => {
                    warn!(session = session.id(), index, "producer: empty audio for chunk");
                    report.failed += 1;
                }
                Ok(audio) => match self.registry.with_current(session, |_| slots.fill(index, audio)) {
                    Some(true) => report.filled += 1,
                    Some(false) => {}
                    None => {
                        report.superseded = true;
                        break;
                    }
                },
                Err(e) => {
                    warn!(session = session.id(), index, error = %e, "producer: no audio for chunk");
                    report.failed += 1;
                }
            }
        }

        debug!(
            session = session.id(),
            filled = report.filled,
            failed = report.failed,
            superseded = report.superseded,
            "producer: done"
        );
        report
    }
}
