use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use super::session_body;
use crate::app::AppState;
use crate::auth::provider::SignupRequest;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth/signup - Register with the auth provider
///
/// Expected Input:
/// ```json
/// { "email": "ada@example.com", "password": "at-least-6", "full_name": "Ada" }
/// ```
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    request
        .validate()
        .map_err(|errors| ApiError::validation_error("Invalid signup request", Some(errors)))?;

    let session = state.auth_client.signup(&request).await?;
    tracing::info!("Signed up user {}", session.user.id);

    Ok(ApiResponse::success(session_body("Signup successful", &session)))
}
