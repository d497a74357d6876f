use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::owner_id;
use crate::app::AppState;
use crate::auth::Identity;
use crate::database::NoteInput;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /notes - all live notes of the caller, newest first
pub async fn list(State(state): State<AppState>, identity: Identity) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    let notes = state.notes.list(user_id).await?;

    Ok(ApiResponse::success(json!({ "count": notes.len(), "notes": notes })))
}

/// POST /notes - create a note owned by the caller
///
/// Expected Input:
/// ```json
/// { "title": "Groceries", "content": "milk, eggs" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    let Json(input) = payload?;
    let note = state.notes.create(user_id, input).await?;

    Ok(ApiResponse::created(json!({ "note": note })))
}

/// GET /notes/search?q= - case-insensitive substring match on title or content
pub async fn search(
    State(state): State<AppState>,
    identity: Identity,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let user_id = owner_id(&identity)?;
    let Query(query) = query?;
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;

    let notes = state.notes.search(user_id, q).await?;

    Ok(ApiResponse::success(json!({ "count": notes.len(), "notes": notes })))
}
