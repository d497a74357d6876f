use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// JWT authentication middleware for protected routes.
///
/// Verifies the bearer token against the cached provider key set and stores
/// the resulting `Identity` in the request extensions. Rejected requests never
/// reach the downstream handler.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(ApiError::unauthorized)?;

    // May refresh the key set from upstream
    let keys = state.jwks.get().await?;

    let identity = state.verifier.verify(&token, &keys).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    debug!("Authenticated request for subject {}", identity.subject);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or("Authorization header required")?;

    let value = header.to_str().map_err(|_| "Invalid authorization format")?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::to_string)
        .ok_or("Invalid authorization format")
}

/// Protected handlers take `Identity` directly; it is only present when the
/// auth middleware ran and accepted the token.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("User not authenticated"))
    }
}
