//! Input loading utilities.

use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Error type for input loading.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse input (tried YAML and JSON)")]
    ParseFailed,
}

/// Loads a YAML or JSON document into the provided type.
pub fn load_input<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, InputError> {
    let data = fs::read(path.as_ref())?;
    parse_input(&data, path.as_ref())
}

/// Parses a document based on file extension, falling back to content sniffing.
pub fn parse_input<T: DeserializeOwned>(data: &[u8], path: impl AsRef<Path>) -> Result<T, InputError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(data)?),
        Some("json") => Ok(serde_json::from_slice(data)?),
        _ => {
            // JSON is a subset of YAML, so try the stricter parser first.
            if let Ok(v) = serde_json::from_slice(data) {
                return Ok(v);
            }
            if let Ok(v) = serde_yaml::from_slice(data) {
                return Ok(v);
            }
            Err(InputError::ParseFailed)
        }
    }
}

/// Reads plain text from a file, or from stdin when `path` is `-`.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, InputError> {
    let path = path.as_ref();
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        role: String,
        text: String,
    }

    #[test]
    fn test_load_yaml_list() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "- role: user\n  text: hi\n- role: model\n  text: hello").unwrap();

        let replies: Vec<Reply> = load_input(file.path()).unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].text, "hello");
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"role": "model", "text": "hello"}}"#).unwrap();

        let reply: Reply = load_input(file.path()).unwrap();
        assert_eq!(reply.role, "model");
    }

    #[test]
    fn test_parse_unknown_extension() {
        let reply: Reply = parse_input(b"role: user\ntext: hi", "chat.txt").unwrap();
        assert_eq!(reply.text, "hi");

        let result: Result<Reply, _> = parse_input(b"invalid data {{{{", "chat.txt");
        assert!(matches!(result, Err(InputError::ParseFailed)));
    }

    #[test]
    fn test_read_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Some reply text.").unwrap();
        assert_eq!(read_text(file.path()).unwrap(), "Some reply text.");
        assert!(matches!(read_text("/nonexistent/chatvoice.txt"), Err(InputError::Read(_))));
    }
}
