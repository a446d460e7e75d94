//! Configuration management for CLI tools.
//!
//! Configuration is stored in ~/.chatvoice/{app_name}/config.yaml and holds
//! any number of named contexts, one of which is current.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".chatvoice";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// A single API context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// API key for the speech service.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// API base URL (optional, uses default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Speech model (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    /// Prebuilt voice name (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub voice: String,

    /// Request timeout in seconds (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Application-specific settings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context. The first context added becomes current.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        if name.is_empty() {
            anyhow::bail!("context name must not be empty");
        }
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        if self.current_context.is_empty() {
            self.current_context = name.to_string();
        }
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    /// Gets a specific context.
    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Gets the current context.
    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or current context if name is empty.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Lists all context names in sorted order.
    pub fn list_contexts(&self) -> Vec<&str> {
        self.contexts.keys().map(|s| s.as_str()).collect()
    }
}

impl Context {
    /// Gets an extra value.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|s| s.as_str())
    }

    /// Sets an extra value.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Returns a copy safe to display, with the API key masked.
    pub fn masked(&self) -> Context {
        Context {
            api_key: mask_api_key(&self.api_key),
            ..self.clone()
        }
    }
}

/// Loads configuration for the specified app, creating an empty file if
/// none exists yet.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config(dir: &TempDir) -> Config {
        let path = dir.path().join("nested").join("config.yaml");
        load_config("chatvoice", path.to_str()).unwrap()
    }

    #[test]
    fn test_load_creates_empty_config() {
        let dir = TempDir::new().unwrap();
        let cfg = temp_config(&dir);
        assert!(cfg.path().exists());
        assert!(cfg.contexts.is_empty());
        assert!(cfg.get_current_context().is_none());
        assert_eq!(cfg.app_name, "chatvoice");
    }

    #[test]
    fn test_context_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut cfg = temp_config(&dir);

        let ctx = Context {
            api_key: "AIzaSyExampleKey1234".to_string(),
            voice: "Puck".to_string(),
            timeout: 30,
            ..Default::default()
        };
        cfg.add_context("work", ctx).unwrap();
        cfg.add_context("home", Context::default()).unwrap();
        assert_eq!(cfg.current_context, "work");
        assert_eq!(cfg.list_contexts(), vec!["home", "work"]);

        // Reload from disk.
        let path = cfg.path().to_str().unwrap().to_string();
        let mut cfg = load_config("chatvoice", Some(&path)).unwrap();
        let work = cfg.resolve_context(None).unwrap();
        assert_eq!(work.name, "work");
        assert_eq!(work.voice, "Puck");
        assert_eq!(work.timeout, 30);
        assert_eq!(cfg.resolve_context(Some("home")).unwrap().name, "home");

        cfg.use_context("home").unwrap();
        assert_eq!(cfg.current_context, "home");
        assert!(cfg.use_context("missing").is_err());

        cfg.delete_context("home").unwrap();
        assert!(cfg.current_context.is_empty());
        assert!(cfg.delete_context("home").is_err());
        assert_eq!(cfg.list_contexts(), vec!["work"]);
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let ctx = Context {
            name: "x".to_string(),
            api_key: "k".to_string(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&ctx).unwrap();
        assert!(yaml.contains("api_key"));
        assert!(!yaml.contains("timeout"));
        assert!(!yaml.contains("extra"));
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("abcd1234wxyz"), "abcd****wxyz");

        let ctx = Context {
            api_key: "abcd1234wxyz".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.masked().api_key, "abcd****wxyz");
    }
}
