//! Chunked speech synthesis and seamless playback for chat replies.
//!
//! Long replies are split into chunks at natural boundaries. A background
//! producer synthesizes the chunks one by one while a consumer plays them in
//! order, so audio starts after the first chunk instead of the whole reply.
//!
//! - [`TextChunker`]: splits text into speakable chunks
//! - [`Synthesizer`] and [`GeminiSynthesizer`]: text to base64 PCM
//! - [`ChunkSlots`]: write-once audio cells shared by producer and consumer
//! - [`SessionRegistry`]: the single active playback session
//! - [`SpeechProducer`] and [`PlaybackConsumer`]: the two halves of a playback
//! - [`SpeechPlayer`]: the entry point tying them together
//! - [`AudioSink`] and [`MessageStore`]: where audio goes and where replies live
//!
//! # Example
//!
//! ```rust,ignore
//! use chatvoice_speech::{SpeechPlayer, PlayerConfig, PlayStart};
//!
//! let player = SpeechPlayer::new(PlayerConfig::default(), synthesizer, sink, store);
//! if let PlayStart::Playing(task) = player.play("msg-1")? {
//!     let outcome = task.finished().await;
//! }
//! ```

mod chunker;
mod consumer;
mod gemini;
mod player;
mod producer;
mod sanitize;
mod session;
mod sink;
mod slot;
mod store;
mod tts;

pub use chunker::*;
pub use consumer::*;
pub use gemini::*;
pub use player::*;
pub use producer::*;
pub use sanitize::*;
pub use session::*;
pub use sink::*;
pub use slot::*;
pub use store::*;
pub use tts::*;
