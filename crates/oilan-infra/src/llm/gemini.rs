//! Google Gemini backend (`generateContent`).
//!
//! The directive travels as `systemInstruction`; assistant turns use the
//! `model` role. The API key is passed as the `key` query parameter and is
//! never logged.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use oilan_core::generation::backend::GenerationBackend;
use oilan_types::dialog::Role;
use oilan_types::generation::{GenerationError, GenerationRequest};

use super::{build_client, status_error, transport_error};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini backend. No Debug derive, same as the OpenAI backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-pro-latest";
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_wire(request: &GenerationRequest) -> Result<GenerateContentRequest<'_>, GenerationError> {
    if request.history.is_empty() {
        return Err(GenerationError::Provider {
            message: "conversation history is empty".to_string(),
        });
    }

    let system_instruction = (!request.directive.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: &request.directive,
        }],
    });

    let contents = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
            }),
            parts: vec![Part {
                text: &turn.content,
            }],
        })
        .collect();

    Ok(GenerateContentRequest {
        system_instruction,
        contents,
    })
}

fn extract_reply(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(text)
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = to_wire(request)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            // The URL carries the key
            .map_err(|e| transport_error(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response.headers().get(reqwest::header::RETRY_AFTER).cloned();
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, model = %self.model, "Gemini request rejected");
            return Err(status_error(status, retry_after.as_ref(), error_body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerationError::MalformedResponse(format!("failed to parse response: {}", e.without_url()))
        })?;

        extract_reply(parsed)
    }
}
