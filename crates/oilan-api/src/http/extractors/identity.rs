//! Caller identity extractor.
//!
//! The authenticating gateway in front of Oilan sets the verified numeric
//! user id in a header (`x-user-id` by default, see
//! `server.identity_header`). Handlers trust it unconditionally.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use oilan_types::ids::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// The verified caller. Extracting this fails with 401 when the header is
/// missing or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub UserId);

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_id_from_headers(&parts.headers, state.identity_header.as_str()).map(Identity)
    }
}

/// Read and parse the identity header.
pub fn user_id_from_headers(headers: &HeaderMap, header: &str) -> Result<UserId, AppError> {
    let value = headers
        .get(header)
        .ok_or_else(|| AppError::Unauthorized(format!("missing '{header}' header")))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.parse::<UserId>().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("'{header}' must be a numeric user id")))
}
