//! Generation backend implementations.
//!
//! Concrete implementations of the [`GenerationBackend`] trait defined in
//! `oilan-core`: a mock for local runs and tests, OpenAI chat completions, and
//! Google Gemini.
//!
//! [`create_backend`] picks one variant of [`Backend`] at startup. The
//! orchestrator is generic over the enum, so calls dispatch by `match`
//! rather than through a vtable.

pub mod gemini;
pub mod mock;
pub mod openai;

use std::time::Duration;

use secrecy::SecretString;

use oilan_core::generation::backend::GenerationBackend;
use oilan_types::config::{BackendConfig, BackendKind};
use oilan_types::generation::{GenerationError, GenerationRequest};

use self::gemini::GeminiBackend;
use self::mock::MockBackend;
use self::openai::OpenAiBackend;

/// The backend selected at startup.
pub enum Backend {
    Mock(MockBackend),
    OpenAi(OpenAiBackend),
    Gemini(GeminiBackend),
}

impl GenerationBackend for Backend {
    fn name(&self) -> &str {
        match self {
            Backend::Mock(b) => b.name(),
            Backend::OpenAi(b) => b.name(),
            Backend::Gemini(b) => b.name(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        match self {
            Backend::Mock(b) => b.generate(request).await,
            Backend::OpenAi(b) => b.generate(request).await,
            Backend::Gemini(b) => b.generate(request).await,
        }
    }
}

/// Environment variable consulted for the API key of `config`.
///
/// `None` for backends that need no key.
pub fn api_key_env_var(config: &BackendConfig) -> Option<String> {
    if let Some(name) = &config.api_key_env {
        return Some(name.clone());
    }
    match config.kind {
        BackendKind::Mock => None,
        BackendKind::OpenAi => Some("OPENAI_API_KEY".to_string()),
        BackendKind::Gemini => Some("GEMINI_API_KEY".to_string()),
    }
}

/// Read the API key for `config` from the process environment.
pub fn api_key_from_env(config: &BackendConfig) -> Option<String> {
    api_key_env_var(config)
        .and_then(|name| std::env::var(name).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Create a [`Backend`] from configuration.
///
/// # Errors
///
/// Returns [`GenerationError::Configuration`] if a cloud backend has no API
/// key, or if the HTTP client cannot be built.
pub fn create_backend(
    config: &BackendConfig,
    api_key: Option<&str>,
) -> Result<Backend, GenerationError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.kind {
        BackendKind::Mock => Ok(Backend::Mock(MockBackend::new(
            config.mock_reply.clone(),
            Duration::from_millis(config.mock_delay_ms),
        ))),
        BackendKind::OpenAi => {
            let key = require_key(config, api_key)?;
            let mut backend = OpenAiBackend::new(
                key,
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| OpenAiBackend::DEFAULT_MODEL.to_string()),
                timeout,
            )?;
            if let Some(base_url) = &config.base_url {
                backend = backend.with_base_url(base_url.clone());
            }
            Ok(Backend::OpenAi(backend))
        }
        BackendKind::Gemini => {
            let key = require_key(config, api_key)?;
            let mut backend = GeminiBackend::new(
                key,
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| GeminiBackend::DEFAULT_MODEL.to_string()),
                timeout,
            )?;
            if let Some(base_url) = &config.base_url {
                backend = backend.with_base_url(base_url.clone());
            }
            Ok(Backend::Gemini(backend))
        }
    }
}

fn require_key(config: &BackendConfig, api_key: Option<&str>) -> Result<SecretString, GenerationError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.to_string())),
        _ => Err(GenerationError::Configuration(format!(
            "{} backend requires an API key (set {})",
            config.kind,
            api_key_env_var(config).unwrap_or_default()
        ))),
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Configuration(format!("failed to create HTTP client: {e}")))
}

/// Map a non-2xx provider response to a [`GenerationError`].
pub(crate) fn status_error(
    status: reqwest::StatusCode,
    retry_after: Option<&reqwest::header::HeaderValue>,
    body: String,
) -> GenerationError {
    match status.as_u16() {
        401 | 403 => GenerationError::Authentication,
        429 => GenerationError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000)),
        },
        _ => GenerationError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> GenerationError {
    GenerationError::Transport(format!("HTTP request failed: {err}"))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: BackendKind) -> BackendConfig {
        BackendConfig {
            kind,
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_create_backend_mock_needs_no_key() {
        let backend = create_backend(&config(BackendKind::Mock), None).unwrap();
        assert_eq!(backend.name(), "mock");
    }

    #[test]
    fn test_create_backend_openai() {
        let backend = create_backend(&config(BackendKind::OpenAi), Some("sk-test")).unwrap();
        assert_eq!(backend.name(), "openai");
        let Backend::OpenAi(inner) = backend else {
            panic!("expected openai backend");
        };
        assert_eq!(inner.model(), "gpt-4o");
    }

    #[test]
    fn test_create_backend_gemini_with_model_override() {
        let mut cfg = config(BackendKind::Gemini);
        cfg.model = Some("gemini-2.0-flash".to_string());
        let backend = create_backend(&cfg, Some("AIza-test")).unwrap();
        let Backend::Gemini(inner) = backend else {
            panic!("expected gemini backend");
        };
        assert_eq!(inner.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_create_backend_missing_key() {
        for kind in [BackendKind::OpenAi, BackendKind::Gemini] {
            let result = create_backend(&config(kind), None);
            assert!(matches!(result, Err(GenerationError::Configuration(_))));
            let result = create_backend(&config(kind), Some("  "));
            assert!(matches!(result, Err(GenerationError::Configuration(_))));
        }
    }

    #[test]
    fn test_api_key_env_var_defaults_and_override() {
        assert_eq!(api_key_env_var(&config(BackendKind::Mock)), None);
        assert_eq!(
            api_key_env_var(&config(BackendKind::OpenAi)).as_deref(),
            Some("OPENAI_API_KEY")
        );
        assert_eq!(
            api_key_env_var(&config(BackendKind::Gemini)).as_deref(),
            Some("GEMINI_API_KEY")
        );

        let mut cfg = config(BackendKind::OpenAi);
        cfg.api_key_env = Some("OILAN_TEST_KEY".to_string());
        assert_eq!(api_key_env_var(&cfg).as_deref(), Some("OILAN_TEST_KEY"));
    }

    #[test]
    fn test_status_error_mapping() {
        use reqwest::StatusCode;
        use reqwest::header::HeaderValue;

        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, None, String::new()),
            GenerationError::Authentication
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, None, String::new()),
            GenerationError::Authentication
        ));

        let retry = HeaderValue::from_static("7");
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(&retry), String::new()),
            GenerationError::RateLimited {
                retry_after_ms: Some(7000)
            }
        ));

        match status_error(StatusCode::BAD_GATEWAY, None, "upstream".to_string()) {
            GenerationError::Provider { message } => assert!(message.contains("upstream")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_huge_retry_after_saturates() {
        use reqwest::StatusCode;
        use reqwest::header::HeaderValue;

        let cases = [
            ("18446744073709552", u64::MAX),
            ("18446744073709551", 18_446_744_073_709_551_000),
        ];
        for (raw, expected) in cases {
            let retry = HeaderValue::from_static(raw);
            match status_error(StatusCode::TOO_MANY_REQUESTS, Some(&retry), String::new()) {
                GenerationError::RateLimited { retry_after_ms } => {
                    assert_eq!(retry_after_ms, Some(expected));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_backend_through_enum() {
        let mut cfg = config(BackendKind::Mock);
        cfg.mock_reply = "canned".to_string();
        let backend = create_backend(&cfg, None).unwrap();

        let request = GenerationRequest {
            history: Vec::new(),
            directive: String::new(),
        };
        assert_eq!(backend.generate(&request).await.unwrap(), "canned");
    }
}
