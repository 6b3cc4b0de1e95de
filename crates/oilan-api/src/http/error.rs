//! Application error type mapping to HTTP status codes.
//!
//! Error bodies have the shape `{"errors":[{"code": "...", "message": "..."}]}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use oilan_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Orchestrator errors.
    Chat(ChatError),
    /// Missing or malformed identity.
    Unauthorized(String),
    /// Malformed path or body.
    Validation(String),
    /// Failure outside the orchestrator (e.g. a panicked turn task).
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Chat(e) => {
                let status = match e {
                    ChatError::NotFound(_) => StatusCode::NOT_FOUND,
                    ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
                    ChatError::Validation(_) => StatusCode::BAD_REQUEST,
                    ChatError::Generation(_) | ChatError::Storage(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.code())
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Chat(ChatError::Storage(e)) => {
                // Storage details stay in the logs
                tracing::error!(error = %e, "Storage failure");
                "internal storage error".to_string()
            }
            AppError::Chat(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
        };

        let body = json!({
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
