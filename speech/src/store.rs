//! Chat messages and where their cached audio lives.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Model,
}

/// A chat message that may carry merged audio of its full text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    pub text: String,
    /// Merged base64 PCM of the whole text, once produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
}

impl ChatMessage {
    /// Creates a model reply without audio.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            audio_data: None,
        }
    }

    /// Returns the cached audio, if present and non-empty.
    pub fn cached_audio(&self) -> Option<&str> {
        self.audio_data.as_deref().filter(|a| !a.is_empty())
    }
}

/// Access to chat messages by id.
pub trait MessageStore: Send + Sync {
    /// Returns a copy of the message with the given id.
    fn message(&self, id: &str) -> Option<ChatMessage>;

    /// Attaches merged audio to a message unless it already has some.
    ///
    /// Returns true if the audio was stored. Empty audio is never stored.
    fn attach_audio(&self, id: &str, audio: String) -> bool;
}

/// Returns the id under which the `index`-th message of a conversation is stored.
pub fn message_id(index: usize) -> String {
    format!("msg-{index}")
}

/// In-memory message store.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<HashMap<String, ChatMessage>>,
}

impl MemoryMessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a conversation, keyed by [`message_id`].
    pub fn from_conversation(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        let store = Self::new();
        for (i, msg) in messages.into_iter().enumerate() {
            store.insert(message_id(i), msg);
        }
        store
    }

    /// Inserts or replaces a message.
    pub fn insert(&self, id: impl Into<String>, message: ChatMessage) {
        self.messages.write().insert(id.into(), message);
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl MessageStore for MemoryMessageStore {
    fn message(&self, id: &str) -> Option<ChatMessage> {
        self.messages.read().get(id).cloned()
    }

    fn attach_audio(&self, id: &str, audio: String) -> bool {
        if audio.is_empty() {
            return false;
        }
        let mut messages = self.messages.write();
        match messages.get_mut(id) {
            Some(msg) if msg.cached_audio().is_none() => {
                msg.audio_data = Some(audio);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_audio_first_writer_wins() {
        let store = MemoryMessageStore::new();
        store.insert("m", ChatMessage::reply("hi"));

        assert!(store.attach_audio("m", "AAAA".to_string()));
        assert!(!store.attach_audio("m", "BBBB".to_string()));
        assert_eq!(store.message("m").unwrap().audio_data.as_deref(), Some("AAAA"));
        assert!(!store.attach_audio("missing", "CCCC".to_string()));
    }

    #[test]
    fn test_empty_audio_counts_as_missing() {
        let store = MemoryMessageStore::new();
        store.insert(
            "m",
            ChatMessage {
                audio_data: Some(String::new()),
                ..ChatMessage::reply("hi")
            },
        );
        assert!(store.message("m").unwrap().cached_audio().is_none());
        assert!(!store.attach_audio("m", String::new()));
        assert!(store.attach_audio("m", "AAAA".to_string()));
    }

    #[test]
    fn test_from_conversation() {
        let store = MemoryMessageStore::from_conversation(vec![
            ChatMessage {
                role: Role::User,
                text: "question".to_string(),
                audio_data: None,
            },
            ChatMessage::reply("answer"),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.message(&message_id(1)).unwrap().text, "answer");
        assert_eq!(store.message("msg-0").unwrap().role, Role::User);
    }

    #[test]
    fn test_message_serde() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","text":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.audio_data, None);

        let msg: ChatMessage = serde_json::from_str(r#"{"text":"yo","audio_data":"AAAA"}"#).unwrap();
        assert_eq!(msg.role, Role::Model);
        assert_eq!(msg.cached_audio(), Some("AAAA"));
        assert!(!serde_json::to_string(&ChatMessage::reply("x")).unwrap().contains("audio_data"));
    }
}
