use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::jwks::KeySet;
use super::Identity;
use crate::config::AuthConfig;

/// Why a bearer token was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signing key is not recognized")]
    UnknownKey,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token audience is not accepted")]
    InvalidAudience,

    #[error("Token has expired")]
    Expired,

    #[error("User ID not found in token")]
    MissingSubject,
}

/// Claims we read after the signature checks out. `exp` (and `aud` when
/// configured) are validated by jsonwebtoken from the raw payload.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
}

/// Optional profile claims are informational; non-string values are dropped.
fn string_claim(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenVerifier {
    audience: Option<String>,
    leeway_secs: u64,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            audience: config.audience.clone(),
            leeway_secs: config.leeway_secs,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Validate `token` against `keys` and return the subject it was issued to.
    ///
    /// Nothing in the token is trusted until the signature has been checked
    /// with the key named by its `kid` header. The token's own `alg` must match
    /// the algorithm the key set pins for that key.
    pub fn verify(&self, token: &str, keys: &KeySet) -> Result<Identity, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing kid header".to_string()))?;

        let key = keys.get(&kid).ok_or(VerifyError::UnknownKey)?;

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<TokenClaims>(token, &key.key, &validation).map_err(classify)?;
        let claims = data.claims;

        let subject = match claims.sub {
            Some(Value::String(sub)) if !sub.is_empty() => sub,
            _ => return Err(VerifyError::MissingSubject),
        };

        Ok(Identity {
            subject,
            email: string_claim(claims.email),
            role: string_claim(claims.role),
        })
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> VerifyError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => VerifyError::InvalidSignature,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::InvalidAudience => VerifyError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) => {
            VerifyError::Malformed(format!("missing {} claim", claim))
        }
        _ => VerifyError::Malformed(err.to_string()),
    }
}
