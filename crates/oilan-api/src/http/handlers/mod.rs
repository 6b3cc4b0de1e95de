//! HTTP request handlers.

pub mod dialog;
pub mod message;
pub mod ws;

use serde::de::DeserializeOwned;

use oilan_types::ids::DialogId;

use crate::http::error::AppError;

/// Parse a `{id}` path segment.
pub(crate) fn parse_dialog_id(raw: &str) -> Result<DialogId, AppError> {
    raw.parse::<DialogId>()
        .map_err(|_| AppError::Validation(format!("invalid dialog id '{raw}'")))
}

/// Parse an optional JSON body. An empty body yields the default value.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))
}
