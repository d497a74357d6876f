use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /auth/whoami - the identity the bearer token was issued to
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "subject": "user_uuid", "email": "user@example.com", "role": "authenticated" }
/// }
/// ```
pub async fn whoami(identity: Identity) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}
