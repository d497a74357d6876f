use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::utils::{owner_id, parse_note_id};
use crate::app::AppState;
use crate::auth::Identity;
use crate::database::NoteInput;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /notes/:id
pub async fn get(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    let note = state.notes.get(user_id, parse_note_id(&id)?).await?;

    Ok(ApiResponse::success(json!({ "note": note })))
}

/// PUT /notes/:id - replace title and content
pub async fn put(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    let id = parse_note_id(&id)?;
    let Json(input) = payload?;
    let note = state.notes.update(user_id, id, input).await?;

    Ok(ApiResponse::success(json!({ "note": note })))
}

/// DELETE /notes/:id - soft delete
pub async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    state.notes.delete(user_id, parse_note_id(&id)?).await?;

    Ok(ApiResponse::success(json!({ "message": "Note deleted successfully" })))
}
