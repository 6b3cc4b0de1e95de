//! Dialog handlers: start, list, and fetch dialogs.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use oilan_types::dialog::{Dialog, DialogSummary};

use super::{parse_body, parse_dialog_id};
use crate::http::error::AppError;
use crate::http::extractors::identity::Identity;
use crate::state::AppState;

/// Request body for starting a dialog. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CreateDialogRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/v1/dialogs - Start a new dialog for the caller.
pub async fn create_dialog(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    body: Bytes,
) -> Result<(StatusCode, Json<Dialog>), AppError> {
    let request: CreateDialogRequest = parse_body(&body)?;
    let dialog = state
        .orchestrator
        .start_dialog(user_id, request.title.as_deref().unwrap_or_default())
        .await?;

    Ok((StatusCode::CREATED, Json(dialog)))
}

/// GET /api/v1/dialogs - List the caller's dialogs, most recent first.
pub async fn list_dialogs(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> Result<Json<Vec<DialogSummary>>, AppError> {
    let dialogs = state.orchestrator.list_dialogs(user_id).await?;
    Ok(Json(dialogs))
}

/// GET /api/v1/dialogs/{id} - Fetch one dialog with its full history.
pub async fn get_dialog(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Path(id): Path<String>,
) -> Result<Json<Dialog>, AppError> {
    let dialog_id = parse_dialog_id(&id)?;
    let dialog = state.orchestrator.dialog_for(dialog_id, user_id).await?;
    Ok(Json(dialog))
}
