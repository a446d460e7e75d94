//! Chunk command: preview how a reply is split for synthesis.

use clap::Args;
use serde::Serialize;

use chatvoice_speech::{TextChunker, clean_for_speech};

use super::{print_result, text_input};
use crate::Cli;

/// Split text into speech chunks and print them.
#[derive(Args)]
pub struct ChunkCommand {
    /// Text to split instead of reading -f (use "-f -" for stdin)
    #[arg(long)]
    text: Option<String>,

    /// Preferred chunk length in characters
    #[arg(long)]
    target: Option<usize>,

    /// Extra characters allowed in the final chunk
    #[arg(long)]
    slack: Option<usize>,

    /// Also show the text each chunk is reduced to before synthesis
    #[arg(long)]
    cleaned: bool,
}

#[derive(Debug, Serialize)]
struct ChunkEntry {
    index: usize,
    chars: usize,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    spoken: Option<String>,
}

impl ChunkCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let text = text_input(cli, self.text.as_deref())?;
        let entries = self.entries(&text);
        print_result(cli, &entries)
    }

    fn chunker(&self) -> TextChunker {
        let defaults = TextChunker::default();
        TextChunker {
            target: self.target.unwrap_or(defaults.target),
            slack: self.slack.unwrap_or(defaults.slack),
            ..defaults
        }
    }

    fn entries(&self, text: &str) -> Vec<ChunkEntry> {
        self.chunker()
            .chunk(text)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| ChunkEntry {
                index,
                chars: chunk.chars().count(),
                spoken: if self.cleaned {
                    Some(clean_for_speech(&chunk).unwrap_or_default())
                } else {
                    None
                },
                text: chunk,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(cleaned: bool) -> ChunkCommand {
        ChunkCommand {
            text: None,
            target: None,
            slack: None,
            cleaned,
        }
    }

    #[test]
    fn test_entries_count_chars() {
        let entries = command(false).entries("Hej då, världen.");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chars, 16);
        assert!(entries[0].spoken.is_none());
    }

    #[test]
    fn test_entries_cleaned() {
        let entries = command(true).entries("**Bold** see https://example.com");
        assert_eq!(entries[0].spoken.as_deref(), Some("Bold see"));
    }

    #[test]
    fn test_thresholds_override_defaults() {
        let cmd = ChunkCommand {
            target: Some(20),
            slack: Some(0),
            ..command(false)
        };
        let chunker = cmd.chunker();
        assert_eq!(chunker.target, 20);
        assert_eq!(chunker.slack, 0);
        assert_eq!(chunker.window, TextChunker::default().window);
    }
}
