//! Server configuration
//!
//! Every field has a default. A TOML file may override any subset, and the
//! `ESD_*` environment variables override the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use esd_discrepancy_core::ClassifierConfig;

use crate::error::StartupError;

/// Top-level server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_level: String,
    pub log_json: bool,
    pub max_body_bytes: usize,
    pub completion: CompletionConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    pub classifier: ClassifierConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            max_body_bytes: 1024 * 1024,
            completion: CompletionConfig::default(),
            auth: AuthConfig::default(),
            catalog: CatalogConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Completion service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API (the client appends `/chat/completions`)
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Completion calls allowed to request tool execution within one chat turn
    pub max_tool_rounds: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 30_000,
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            max_tool_rounds: 4,
        }
    }
}

/// Bearer tokens accepted by the static session provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// token -> user id
    #[serde(skip_serializing)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub include_field_examples: bool,
    /// Additional JSON or YAML catalog files loaded after the built-ins
    pub extra_paths: Vec<PathBuf>,
}

impl ServerConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, StartupError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, StartupError> {
        toml::from_str(text).map_err(|e| StartupError::Config(e.to_string()))
    }

    /// Apply `ESD_*` overrides read through `lookup`
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("ESD_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(level) = lookup("ESD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(json) = lookup("ESD_LOG_JSON") {
            match json.parse() {
                Ok(flag) => self.log_json = flag,
                Err(_) => tracing::warn!(value = %json, "Ignoring invalid ESD_LOG_JSON"),
            }
        }
        if let Some(url) = lookup("ESD_COMPLETION_BASE_URL") {
            self.completion.base_url = url;
        }
        if let Some(key) = lookup("ESD_COMPLETION_API_KEY") {
            self.completion.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(model) = lookup("ESD_COMPLETION_MODEL") {
            self.completion.model = model;
        }
    }
}
