use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use super::session_body;
use crate::app::AppState;
use crate::auth::provider::SigninRequest;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth/signin - Exchange email and password for an access token
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    request
        .validate()
        .map_err(|errors| ApiError::validation_error("Invalid signin request", Some(errors)))?;

    let session = state.auth_client.signin(&request).await?;
    tracing::debug!("Signed in user {}", session.user.id);

    Ok(ApiResponse::success(session_body("Signin successful", &session)))
}
