//! Splitting reply text into speech-synthesis-sized chunks.
//!
//! Short chunks keep per-request synthesis latency low and let playback start
//! before the whole reply is synthesized. Splits prefer sentence ends, then
//! clause ends, then word gaps.

use std::ops::Range;

/// Preferred chunk length in characters.
pub const TARGET_CHUNK_CHARS: usize = 200;

/// How far past the target a final chunk may run.
pub const CHUNK_SLACK_CHARS: usize = 50;

/// Character window of the remaining text searched for a natural boundary.
pub const BOUNDARY_WINDOW: Range<usize> = 150..350;

/// Splits text into chunks at natural boundaries.
///
/// Lengths are counted in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunker {
    /// Preferred chunk length. Word-gap splits happen at or after this point.
    pub target: usize,
    /// Remainders no longer than `target + slack` become the final chunk.
    pub slack: usize,
    /// Window searched for sentence and clause boundaries.
    pub window: Range<usize>,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            target: TARGET_CHUNK_CHARS,
            slack: CHUNK_SLACK_CHARS,
            window: BOUNDARY_WINDOW,
        }
    }
}

/// Splits text into chunks using the default thresholds.
pub fn chunk_text(text: &str) -> Vec<String> {
    TextChunker::default().chunk(text)
}

impl TextChunker {
    /// Returns the length under which text is never split.
    pub fn soft_ceiling(&self) -> usize {
        self.target + self.slack
    }

    /// Splits `text` into trimmed chunks. The result is never empty.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.chars().count() < self.soft_ceiling() {
            return vec![text.to_string()];
        }

        let chars: Vec<char> = text.chars().collect();
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        // next_space[i] is the index of the first space at or after i.
        let mut next_space = vec![None; chars.len() + 1];
        for i in (0..chars.len()).rev() {
            next_space[i] = if chars[i] == ' ' { Some(i) } else { next_space[i + 1] };
        }

        let mut chunks = Vec::new();
        let (mut start, mut end) = (0, chars.len());

        while start < end {
            let rest = &chars[start..end];
            if rest.len() <= self.soft_ceiling() {
                chunks.push(text[offsets[start]..offsets[end]].to_string());
                break;
            }

            let space = next_space
                .get(start + self.target)
                .copied()
                .flatten()
                .filter(|&p| p < end)
                .map(|p| p - start);
            let split = start + self.split_index(rest, space);
            let head = text[offsets[start]..offsets[split]].trim();
            if !head.is_empty() {
                chunks.push(head.to_string());
            }

            // The remainder is trimmed on both ends.
            start = split;
            while start < end && chars[start].is_whitespace() {
                start += 1;
            }
            while end > start && chars[end - 1].is_whitespace() {
                end -= 1;
            }
        }

        if chunks.is_empty() {
            // Only whitespace was peeled off.
            chunks.push(String::new());
        }
        chunks
    }

    /// Returns the character index to split `chars` at, in `1..=chars.len()`.
    ///
    /// `space` is the index of the first space at or after the target.
    fn split_index(&self, chars: &[char], space: Option<usize>) -> usize {
        let start = self.window.start.min(chars.len());
        let end = self.window.end.min(chars.len()).max(start);
        let window = &chars[start..end];

        let idx = find_boundary(window, is_sentence_end)
            .or_else(|| find_boundary(window, is_clause_end))
            .map(|i| start + i + 1)
            .unwrap_or(space.unwrap_or(self.target));

        if idx == 0 {
            self.target.clamp(1, chars.len())
        } else {
            idx.min(chars.len())
        }
    }
}

/// Finds the first punctuation mark in `window` that is followed by whitespace
/// inside the window.
fn find_boundary(window: &[char], is_mark: fn(char) -> bool) -> Option<usize> {
    window
        .windows(2)
        .position(|pair| is_mark(pair[0]) && pair[1].is_whitespace())
}

fn is_sentence_end(c: char) -> bool {
    // U+0589 is the Armenian full stop.
    matches!(c, '\n' | '.' | '!' | '?' | '\u{0589}')
}

fn is_clause_end(c: char) -> bool {
    matches!(c, ',' | ';')
}
