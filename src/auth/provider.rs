//! Thin client for the hosted auth provider (Supabase Auth).
//!
//! Signup and signin are delegated upstream; this service never sees
//! password hashes and never mints tokens itself.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AuthConfig;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("Failed to connect to auth service: {0}")]
    Unreachable(String),

    /// Upstream answered with a non-success status; status and body are relayed
    #[error("Auth service rejected the request with HTTP {status}")]
    Rejected { status: u16, body: Value },

    #[error("Unexpected auth service response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.insert("password".to_string(), "This field is required".to_string());
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "password".to_string(),
                format!("Must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        finish(errors)
    }
}

impl SigninRequest {
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.insert("password".to_string(), "This field is required".to_string());
        }
        finish(errors)
    }
}

fn check_email(email: &str, errors: &mut HashMap<String, String>) {
    let email = email.trim();
    if email.is_empty() {
        errors.insert("email".to_string(), "This field is required".to_string());
        return;
    }
    let valid = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        })
        .unwrap_or(false);
    if !valid || email.chars().any(char::is_whitespace) {
        errors.insert("email".to_string(), "Must be a valid email address".to_string());
    }
}

fn finish(errors: HashMap<String, String>) -> Result<(), HashMap<String, String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// Session issued by the provider. With email confirmation enabled a signup
/// returns only the user, so every token field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub user: ProviderUser,
}

pub struct SupabaseAuthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuthClient {
    pub fn new(client: reqwest::Client, config: &AuthConfig) -> Self {
        Self {
            client,
            base_url: config.supabase_url.clone(),
            api_key: config.supabase_anon_key.clone(),
        }
    }

    /// POST /auth/v1/signup
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthSession, AuthProviderError> {
        let payload = json!({
            "email": request.email.trim(),
            "password": request.password,
            "data": {
                "full_name": request.full_name.clone().unwrap_or_default(),
            },
        });
        self.post("/auth/v1/signup", &payload).await
    }

    /// POST /auth/v1/token?grant_type=password
    pub async fn signin(&self, request: &SigninRequest) -> Result<AuthSession, AuthProviderError> {
        let payload = json!({
            "email": request.email.trim(),
            "password": request.password,
        });
        self.post("/auth/v1/token?grant_type=password", &payload).await
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<AuthSession, AuthProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Forwarding auth request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!("Auth service unreachable: {}", e);
                AuthProviderError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text)
                .unwrap_or_else(|_| json!({ "message": text }));
            return Err(AuthProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;
        parse_session(body)
    }
}

fn parse_session(body: Value) -> Result<AuthSession, AuthProviderError> {
    let has_user = body.get("user").map(|u| !u.is_null()).unwrap_or(false);
    let mut session: AuthSession = serde_json::from_value(body.clone())
        .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;

    // Unconfirmed signups return the user object at the top level
    if !has_user {
        session.user = serde_json::from_value(body)
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))?;
    }
    Ok(session)
}
