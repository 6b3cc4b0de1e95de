//! Turn submission handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Deserialize;

use oilan_types::dialog::Message;

use super::{parse_body, parse_dialog_id};
use crate::http::error::AppError;
use crate::http::extractors::identity::Identity;
use crate::state::AppState;

/// Request body for posting a user turn.
#[derive(Debug, Default, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub content: String,
}

/// POST /api/v1/dialogs/{id}/messages - Submit a turn, returns the assistant reply.
pub async fn post_message(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Message>, AppError> {
    let dialog_id = parse_dialog_id(&id)?;
    let request: PostMessageRequest = parse_body(&body)?;

    // Detached from the request: a dropped connection must not cancel the turn.
    let orchestrator = state.orchestrator.clone();
    let turn = tokio::spawn(async move {
        orchestrator
            .post_turn(dialog_id, user_id, &request.content)
            .await
    });

    let reply = turn.await.map_err(|e| {
        tracing::error!(dialog_id = %dialog_id, error = %e, "Turn task failed");
        AppError::Internal("turn task failed".to_string())
    })??;

    Ok(Json(reply))
}
