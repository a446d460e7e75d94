//! CLI commands module.

mod chunk;
mod config;
mod merge;
mod speak;
mod util;

pub use chunk::ChunkCommand;
pub use config::ConfigCommand;
pub use merge::MergeCommand;
pub use speak::SpeakCommand;

pub(crate) use util::*;
