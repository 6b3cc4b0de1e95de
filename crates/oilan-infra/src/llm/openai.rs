//! OpenAI chat completions backend.
//!
//! Uses [`async_openai`] for the request/response types. The directive goes
//! out as a `system` message ahead of the dialog history, and the first
//! choice is the reply.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse,
};
use secrecy::{ExposeSecret, SecretString};

use oilan_core::generation::backend::GenerationBackend;
use oilan_types::dialog::Role;
use oilan_types::generation::{GenerationError, GenerationRequest};

use super::build_client;

/// OpenAI backend.
///
/// Does not derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl OpenAiBackend {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(
        api_key: SecretString,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = build_client(timeout)?;
        Ok(Self {
            client: openai_client(&api_key, Self::DEFAULT_BASE_URL, http.clone()),
            http,
            api_key,
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.client = openai_client(
            &self.api_key,
            base_url.trim_end_matches('/'),
            self.http.clone(),
        );
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &GenerationRequest) -> CreateChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 1);

        if !request.directive.is_empty() {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(
                        request.directive.clone(),
                    ),
                    name: None,
                },
            ));
        }

        for turn in &request.history {
            let message = match turn.role {
                Role::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            turn.content.clone(),
                        ),
                        name: None,
                    })
                }
                Role::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                turn.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(message);
        }

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            ..Default::default()
        }
    }
}

fn openai_client(api_key: &SecretString, base_url: &str, http: reqwest::Client) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key.expose_secret())
        .with_api_base(base_url);
    Client::with_config(config).with_http_client(http)
}

fn extract_reply(response: CreateChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

/// Map an [`OpenAIError`] to a [`GenerationError`].
fn map_openai_error(err: OpenAIError) -> GenerationError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                GenerationError::Authentication
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                GenerationError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                GenerationError::Provider {
                    message: api_err.message.clone(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => GenerationError::Authentication,
            Some(429) => GenerationError::RateLimited {
                retry_after_ms: None,
            },
            Some(_) => GenerationError::Provider {
                message: err.to_string(),
            },
            None => GenerationError::Transport(format!("HTTP request failed: {err}")),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            GenerationError::MalformedResponse(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => GenerationError::Configuration(msg.clone()),
        _ => GenerationError::Provider {
            message: err.to_string(),
        },
    }
}

impl GenerationBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .chat()
            .create(self.build_request(request))
            .await
            .map_err(|e| {
                let mapped = map_openai_error(e);
                tracing::warn!(model = %self.model, error = %mapped, "OpenAI request failed");
                mapped
            })?;

        extract_reply(response)
    }
}
