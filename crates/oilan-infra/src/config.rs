//! Configuration loader for Oilan.
//!
//! Reads `config.toml` from the data directory (`~/.oilan/` in production)
//! and deserializes it into [`OilanConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use anyhow::Context;

use oilan_types::config::{ChatConfig, OilanConfig};

use crate::sqlite::pool::database_url_in;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "OILAN_DATA_DIR";

/// Directive used when neither `directive` nor `directive_path` is configured.
pub const DEFAULT_DIRECTIVE: &str = "You are a warm, attentive conversation partner. \
Listen carefully, reflect back what you hear, ask gentle open questions, and never \
claim to be a licensed professional.";

/// Resolve the data directory: `OILAN_DATA_DIR`, else `~/.oilan`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".oilan")
}

/// Load configuration from `{data_dir}/config.toml`.
pub async fn load_config(data_dir: &Path) -> OilanConfig {
    load_config_from(&data_dir.join("config.toml")).await
}

/// Load configuration from an explicit path.
///
/// - Missing file: [`OilanConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config_from(config_path: &Path) -> OilanConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return OilanConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return OilanConfig::default();
        }
    };

    match toml::from_str::<OilanConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OilanConfig::default()
        }
    }
}

/// Database URL from config, else the default file in `data_dir`.
pub fn resolve_database_url(config: &OilanConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| database_url_in(data_dir))
}

/// Resolve the directive text.
///
/// Priority: `directive_path` (relative paths resolve against `data_dir`),
/// then inline `directive`, then [`DEFAULT_DIRECTIVE`].
///
/// # Errors
///
/// Fails if `directive_path` is set but cannot be read.
pub async fn resolve_directive(chat: &ChatConfig, data_dir: &Path) -> anyhow::Result<String> {
    if let Some(path) = &chat.directive_path {
        let path = data_dir.join(path);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read directive {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded directive");
        return Ok(text.trim().to_string());
    }

    Ok(chat
        .directive
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oilan_types::config::BackendKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backend.kind, BackendKind::Mock);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 3000
identity_header = "x-forwarded-user"

[backend]
kind = "gemini"
timeout_secs = 30

[chat]
greeting = "Welcome back."
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.identity_header, "x-forwarded-user");
        assert_eq!(config.backend.kind, BackendKind::Gemini);
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.chat.greeting, "Welcome back.");
        assert_eq!(config.chat.apology, "Sorry, an error occurred.");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn resolve_database_url_prefers_config() {
        let mut config = OilanConfig::default();
        let data_dir = Path::new("/data");
        assert_eq!(resolve_database_url(&config, data_dir), "sqlite:///data/oilan.db");

        config.database.url = Some("sqlite://elsewhere.db".to_string());
        assert_eq!(resolve_database_url(&config, data_dir), "sqlite://elsewhere.db");
    }

    #[tokio::test]
    async fn resolve_directive_priority() {
        let tmp = TempDir::new().unwrap();
        let mut chat = ChatConfig::default();

        assert_eq!(resolve_directive(&chat, tmp.path()).await.unwrap(), DEFAULT_DIRECTIVE);

        chat.directive = Some("  Inline directive.  ".to_string());
        assert_eq!(
            resolve_directive(&chat, tmp.path()).await.unwrap(),
            "Inline directive."
        );

        tokio::fs::write(tmp.path().join("prompt.txt"), "From file.\n")
            .await
            .unwrap();
        chat.directive_path = Some("prompt.txt".to_string());
        assert_eq!(resolve_directive(&chat, tmp.path()).await.unwrap(), "From file.");
    }

    #[tokio::test]
    async fn resolve_directive_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let chat = ChatConfig {
            directive_path: Some("missing.txt".to_string()),
            ..ChatConfig::default()
        };
        let err = resolve_directive(&chat, tmp.path()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read directive"));
        assert!(err.to_string().contains("missing.txt"));
        // The io error is kept as the source, not flattened into the message.
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }
}
