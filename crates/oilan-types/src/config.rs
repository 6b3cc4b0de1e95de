//! Configuration types for Oilan.
//!
//! `OilanConfig` represents the top-level `config.toml`. Every field has a
//! default so a missing or partial file still yields a runnable server.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Top-level configuration, loaded from `~/.oilan/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OilanConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// HTTP listener and identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Header carrying the verified user id, set by the upstream gateway.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            identity_header: default_identity_header(),
        }
    }
}

/// Database location. `None` means `sqlite://{data_dir}/oilan.db`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
}

/// Which generation backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Mock,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Mock => write!(f, "mock"),
            BackendKind::OpenAi => write!(f, "openai"),
            BackendKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(BackendKind::Mock),
            "openai" => Ok(BackendKind::OpenAi),
            "gemini" => Ok(BackendKind::Gemini),
            other => Err(format!("invalid backend: '{other}' (expected mock, openai, gemini)")),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Model override; each backend has its own default.
    #[serde(default)]
    pub model: Option<String>,
    /// API base URL override (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key; defaults per backend.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed reply of the mock backend.
    #[serde(default = "default_mock_reply")]
    pub mock_reply: String,
    /// Simulated latency of the mock backend.
    #[serde(default)]
    pub mock_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_mock_reply() -> String {
    "This is a mock response from the AI. The real LLM is not connected yet.".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            model: None,
            base_url: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            mock_reply: default_mock_reply(),
            mock_delay_ms: 0,
        }
    }
}

/// Conversation behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Inline directive; ignored when `directive_path` is set.
    #[serde(default)]
    pub directive: Option<String>,
    /// File containing the directive, read once at startup.
    #[serde(default)]
    pub directive_path: Option<String>,
    /// First frame sent on a new realtime connection.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Frame sent when a realtime turn fails to generate.
    #[serde(default = "default_apology")]
    pub apology: String,
    /// Title of dialogs opened by realtime connections.
    #[serde(default = "default_websocket_title")]
    pub websocket_title: String,
    /// Generation attempts per turn. 1 means no retry.
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

fn default_greeting() -> String {
    "Hello! I am ready. How can I help you today?".to_string()
}

fn default_apology() -> String {
    "Sorry, an error occurred.".to_string()
}

fn default_websocket_title() -> String {
    "New WebSocket Chat".to_string()
}

fn default_max_generation_attempts() -> u32 {
    1
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            directive: None,
            directive_path: None,
            greeting: default_greeting(),
            apology: default_apology(),
            websocket_title: default_websocket_title(),
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = OilanConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.identity_header, "x-user-id");
        assert_eq!(config.backend.kind, BackendKind::Mock);
        assert_eq!(config.chat.max_generation_attempts, 1);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: OilanConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.chat.apology, "Sorry, an error occurred.");
        assert_eq!(config.backend.timeout_secs, 120);
    }

    #[test]
    fn test_config_deserialize_partial_sections() {
        let toml_str = r#"
[server]
port = 9090

[backend]
kind = "openai"
model = "gpt-4o-mini"

[chat]
directive = "Listen carefully."
max_generation_attempts = 3
"#;
        let config: OilanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.kind, BackendKind::OpenAi);
        assert_eq!(config.backend.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.chat.directive.as_deref(), Some("Listen carefully."));
        assert_eq!(config.chat.max_generation_attempts, 3);
        assert_eq!(config.chat.greeting, "Hello! I am ready. How can I help you today?");
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
        assert_eq!("gemini".parse::<BackendKind>().unwrap(), BackendKind::Gemini);
        assert!("bard".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::OpenAi.to_string(), "openai");
    }
}
