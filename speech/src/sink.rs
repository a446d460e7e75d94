//! Audio playback primitives.

use chatvoice_audio::AudioBuffer;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Error type for audio sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("sink closed")]
    Closed,
    #[error("other error: {0}")]
    Other(String),
}

/// A sounding audio source.
pub trait PlaybackHandle: Send + Sync {
    /// Stops playback. Stopping a stopped or finished source does nothing.
    fn stop(&self);
}

/// A started playback.
pub struct Playback {
    /// Handle used to stop the source early.
    pub handle: Arc<dyn PlaybackHandle>,
    /// Resolves once the buffer has played to its end. The sender is dropped
    /// without a value when playback is stopped.
    pub finished: oneshot::Receiver<()>,
}

/// Something that can play audio buffers.
pub trait AudioSink: Send + Sync {
    /// Starts playing `buffer` immediately.
    fn start(&self, buffer: AudioBuffer) -> Result<Playback, SinkError>;
}

/// A sink that hands each buffer to a writer as 16-bit PCM and reports the
/// end of playback after the buffer's real-time duration.
///
/// Must be used from within a tokio runtime.
pub struct PacedSink<W> {
    writer: Arc<Mutex<W>>,
}

impl<W: Write + Send + 'static> PacedSink<W> {
    /// Creates a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Runs `f` with the underlying writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        let mut writer = self.writer.lock();
        f(&mut *writer)
    }
}

impl<W: Write + Send + 'static> AudioSink for PacedSink<W> {
    fn start(&self, buffer: AudioBuffer) -> Result<Playback, SinkError> {
        {
            let mut writer = self.writer.lock();
            writer.write_all(&buffer.to_pcm16le())?;
            writer.flush()?;
        }

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let duration = buffer.duration();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    let _ = tx.send(());
                }
            }
        });

        Ok(Playback {
            handle: Arc::new(PacedHandle { cancel }),
            finished: rx,
        })
    }
}

struct PacedHandle {
    cancel: CancellationToken,
}

impl PlaybackHandle for PacedHandle {
    fn stop(&self) {
        self.cancel.cancel();
    }
}
