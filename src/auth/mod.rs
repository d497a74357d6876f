pub mod jwks;
pub mod provider;
pub mod verifier;

use serde::Serialize;
use uuid::Uuid;

pub use jwks::{FetchError, HttpJwksSource, JwksSource, KeySet, KeySetCache};
pub use provider::{AuthProviderError, SupabaseAuthClient};
pub use verifier::{TokenVerifier, VerifyError};

/// Authenticated principal extracted from a verified access token.
///
/// Inserted into request extensions by the auth middleware and read by
/// protected handlers through its `FromRequestParts` impl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Identity {
    /// Supabase subjects are user UUIDs; notes are keyed by them.
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.subject)
    }
}
