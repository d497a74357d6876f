// handlers/public/auth/mod.rs - Token acquisition endpoints
//
// Both forward to the hosted auth provider; upstream rejections are relayed
// with their original status and body.
pub mod signin;
pub mod signup;

use serde_json::{json, Value};

use crate::auth::provider::AuthSession;

pub use signin::signin;
pub use signup::signup;

/// Body shared by both endpoints on success
fn session_body(message: &str, session: &AuthSession) -> Value {
    json!({
        "message": message,
        "user": {
            "id": session.user.id,
            "email": session.user.email,
        },
        "access_token": session.access_token,
        "refresh_token": session.refresh_token,
        "expires_in": session.expires_in,
    })
}
