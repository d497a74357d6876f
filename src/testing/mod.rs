use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::auth::jwks::{FetchError, JwksSource};

pub const KID_ONE: &str = "k1";
pub const KID_TWO: &str = "k2";

/// Raw HMAC secrets and their base64url form as published in a JWKS `k` field.
/// `tests/common` carries a copy for the integration tests; keep them equal.
const SECRETS: &[(&str, &[u8], &str)] = &[
    (
        KID_ONE,
        b"notes-api-test-signing-secret-one!",
        "bm90ZXMtYXBpLXRlc3Qtc2lnbmluZy1zZWNyZXQtb25lIQ",
    ),
    (
        KID_TWO,
        b"notes-api-test-signing-secret-two!",
        "bm90ZXMtYXBpLXRlc3Qtc2lnbmluZy1zZWNyZXQtdHdvIQ",
    ),
];

fn secret_for(kid: &str) -> (&'static [u8], &'static str) {
    SECRETS
        .iter()
        .find(|(k, _, _)| *k == kid)
        .map(|(_, raw, encoded)| (*raw, *encoded))
        .unwrap_or_else(|| panic!("no test secret for kid {kid}"))
}

/// JWKS document publishing HS256 keys for the given kids
pub fn jwks_with(kids: &[&str]) -> JwkSet {
    let keys: Vec<Value> = kids
        .iter()
        .map(|kid| {
            let (_, encoded) = secret_for(kid);
            json!({ "kty": "oct", "kid": kid, "alg": "HS256", "k": encoded })
        })
        .collect();
    serde_json::from_value(json!({ "keys": keys })).expect("valid test JWKS")
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign arbitrary claims with the secret behind `kid`
pub fn sign(kid: Option<&str>, claims: &Value) -> String {
    let (raw, _) = secret_for(kid.unwrap_or(KID_ONE));
    let header = Header {
        kid: kid.map(str::to_string),
        ..Header::new(Algorithm::HS256)
    };
    encode(&header, claims, &EncodingKey::from_secret(raw)).expect("sign test token")
}

pub fn token_for(kid: &str, sub: &str, exp_offset_secs: i64) -> String {
    sign(
        Some(kid),
        &json!({ "sub": sub, "exp": now_secs() + exp_offset_secs, "email": "user@example.com", "role": "authenticated" }),
    )
}

/// In-process key source with a fetch counter
pub struct FakeJwksSource {
    response: Mutex<Result<JwkSet, FetchError>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeJwksSource {
    pub fn serving(kids: &[&str]) -> Self {
        Self {
            response: Mutex::new(Ok(jwks_with(kids))),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self {
            response: Mutex::new(Err(err)),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_kids(&self, kids: &[&str]) {
        *self.response.lock().unwrap() = Ok(jwks_with(kids));
    }

    pub fn fail_with(&self, err: FetchError) {
        *self.response.lock().unwrap() = Err(err);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JwksSource for FakeJwksSource {
    async fn fetch(&self) -> Result<JwkSet, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().unwrap().clone()
    }
}
