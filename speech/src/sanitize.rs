//! Cleaning chat text before it is sent to a speech synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest text sent to the synthesizer in one request, in characters.
pub const MAX_SPEECH_CHARS: usize = 2000;

/// Shortest cleaned text worth synthesizing, in characters.
pub const MIN_SPEECH_CHARS: usize = 2;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*#_\[\]`~>|\\@$%^&()+=]").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strips URLs and Markdown symbols, collapses whitespace and caps the length.
///
/// Returns `None` if nothing speakable remains.
pub fn clean_for_speech(text: &str) -> Option<String> {
    let text = URL_RE.replace_all(text, " ");
    let text = SYMBOL_RE.replace_all(&text, " ");
    let text = SPACE_RE.replace_all(&text, " ");
    let text = text.trim();

    let cleaned: String = match text.char_indices().nth(MAX_SPEECH_CHARS) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    };

    if cleaned.chars().count() < MIN_SPEECH_CHARS {
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_urls_and_markdown() {
        let cleaned = clean_for_speech("**Bold** see https://example.com/a?b=c and [link](x)").unwrap();
        assert_eq!(cleaned, "Bold see and link x");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_for_speech("  a\n\n b\t c  ").unwrap(), "a b c");
    }

    #[test]
    fn test_keeps_sentence_punctuation() {
        assert_eq!(clean_for_speech("Hi, you! Ok? Yes.").unwrap(), "Hi, you! Ok? Yes.");
    }

    #[test]
    fn test_caps_length() {
        let cleaned = clean_for_speech(&"é".repeat(2500)).unwrap();
        assert_eq!(cleaned.chars().count(), MAX_SPEECH_CHARS);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(clean_for_speech(""), None);
        assert_eq!(clean_for_speech("a"), None);
        assert_eq!(clean_for_speech("### *** https://x.y"), None);
        assert_eq!(clean_for_speech("ok").as_deref(), Some("ok"));
    }
}
