//! Generation backend request types and errors.
//!
//! These are provider-agnostic: each backend translates a
//! [`GenerationRequest`] into its own wire format.

use serde::{Deserialize, Serialize};

use crate::dialog::{Message, Role};

/// One entry of the history handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Everything a backend needs to produce the next assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Full dialog history, oldest first, ending with the latest user turn.
    pub history: Vec<Turn>,
    /// Instruction text sent ahead of the history.
    pub directive: String,
}

impl GenerationRequest {
    /// Build a request from stored messages, preserving their order.
    pub fn from_messages(messages: &[Message], directive: impl Into<String>) -> Self {
        Self {
            history: messages.iter().map(Turn::from).collect(),
            directive: directive.into(),
        }
    }
}

/// Errors from generation backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed")]
    Authentication,

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("backend returned no usable content")]
    EmptyResponse,

    #[error("backend misconfigured: {0}")]
    Configuration(String),
}
