//! Verification key set fetched from the auth provider's JWKS endpoint.
//!
//! The cache is shared by every request. An entry is replaced wholesale on
//! refresh and never evicted by a failed refresh, so a flaky upstream keeps
//! serving the last key set that was known to be good.

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Failure to obtain a usable key set from upstream.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("JWKS request failed: {0}")]
    Request(String),

    #[error("JWKS endpoint returned HTTP {0}")]
    Status(u16),

    #[error("JWKS response is not a valid key set: {0}")]
    Malformed(String),

    #[error("JWKS fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Where key sets come from. The HTTP source is used in production.
#[async_trait]
pub trait JwksSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, FetchError>;
}

/// Fetches `{issuer}/auth/v1/.well-known/jwks.json` over HTTP.
pub struct HttpJwksSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpJwksSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl JwksSource for HttpJwksSource {
    async fn fetch(&self) -> Result<JwkSet, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// A decoding key together with the one algorithm it may verify.
#[derive(Clone)]
pub struct VerificationKey {
    pub(crate) key: DecodingKey,
    pub(crate) algorithm: Algorithm,
}

impl VerificationKey {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Key identifier to verification key. Immutable once built.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, VerificationKey>,
}

impl KeySet {
    /// Build from a JWKS document. Keys without a `kid`, with an unsupported
    /// type, or with unusable material are skipped.
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        let mut keys = HashMap::new();

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("Skipping JWKS key without kid");
                continue;
            };

            let Some(algorithm) = algorithm_for(jwk) else {
                warn!("Skipping JWKS key {}: unsupported algorithm", kid);
                continue;
            };

            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, VerificationKey { key, algorithm });
                }
                Err(e) => warn!("Skipping JWKS key {}: {}", kid, e),
            }
        }

        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<&String> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("KeySet").field("kids", &kids).finish()
    }
}

/// Pin each key to a single algorithm so a token header cannot pick one.
fn algorithm_for(jwk: &Jwk) -> Option<Algorithm> {
    match jwk.common.key_algorithm {
        Some(KeyAlgorithm::HS256) => Some(Algorithm::HS256),
        Some(KeyAlgorithm::HS384) => Some(Algorithm::HS384),
        Some(KeyAlgorithm::HS512) => Some(Algorithm::HS512),
        Some(KeyAlgorithm::ES256) => Some(Algorithm::ES256),
        Some(KeyAlgorithm::ES384) => Some(Algorithm::ES384),
        Some(KeyAlgorithm::RS256) => Some(Algorithm::RS256),
        Some(KeyAlgorithm::RS384) => Some(Algorithm::RS384),
        Some(KeyAlgorithm::RS512) => Some(Algorithm::RS512),
        Some(KeyAlgorithm::PS256) => Some(Algorithm::PS256),
        Some(KeyAlgorithm::PS384) => Some(Algorithm::PS384),
        Some(KeyAlgorithm::PS512) => Some(Algorithm::PS512),
        Some(KeyAlgorithm::EdDSA) => Some(Algorithm::EdDSA),
        // Encryption algorithms never sign tokens
        Some(_) => None,
        None => match &jwk.algorithm {
            AlgorithmParameters::RSA(_) => Some(Algorithm::RS256),
            AlgorithmParameters::EllipticCurve(params) => match params.curve {
                EllipticCurve::P256 => Some(Algorithm::ES256),
                EllipticCurve::P384 => Some(Algorithm::ES384),
                _ => None,
            },
            AlgorithmParameters::OctetKey(_) => Some(Algorithm::HS256),
            AlgorithmParameters::OctetKeyPair(_) => Some(Algorithm::EdDSA),
        },
    }
}

struct CacheEntry {
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

/// Process-wide, time-bounded cache of the upstream key set.
///
/// At most one refresh runs at a time. While it runs, other callers get the
/// previous key set if there is one, otherwise they wait for the refresh.
pub struct KeySetCache {
    source: Arc<dyn JwksSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    serve_stale: bool,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    refresh: Mutex<()>,
}

impl KeySetCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(source: Arc<dyn JwksSource>) -> Self {
        Self {
            source,
            ttl: Self::DEFAULT_TTL,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            serve_stale: true,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// When disabled, a failed refresh of an expired entry is reported as an
    /// error instead of serving the expired key set. The entry is kept either way.
    pub fn with_serve_stale(mut self, serve_stale: bool) -> Self {
        self.serve_stale = serve_stale;
        self
    }

    /// Current key set, refreshing first if the cached one is older than the TTL.
    pub async fn get(&self) -> Result<Arc<KeySet>, FetchError> {
        let current = self.current().await;
        if let Some(entry) = current.as_ref().filter(|e| self.is_live(e)) {
            return Ok(entry.keys.clone());
        }

        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(entry) = current.as_ref().filter(|_| self.serve_stale) {
                    debug!("JWKS refresh already in flight, serving previous key set");
                    return Ok(entry.keys.clone());
                }
                self.refresh.lock().await
            }
        };

        // Another caller may have finished a refresh while we were acquiring the lock
        let current = self.current().await;
        if let Some(entry) = current.as_ref().filter(|e| self.is_live(e)) {
            return Ok(entry.keys.clone());
        }

        match self.fetch().await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                let entry = Arc::new(CacheEntry {
                    keys: keys.clone(),
                    fetched_at: Instant::now(),
                });
                *self.entry.write().await = Some(entry);
                info!("Refreshed JWKS cache with {} keys", keys.len());
                Ok(keys)
            }
            Err(e) => match current {
                Some(entry) if self.serve_stale => {
                    warn!("JWKS refresh failed, serving last known key set: {}", e);
                    Ok(entry.keys.clone())
                }
                _ => Err(e),
            },
        }
    }

    /// True when a cached entry exists and is younger than the TTL.
    pub async fn is_fresh(&self) -> bool {
        self.current()
            .await
            .map(|entry| self.is_live(&entry))
            .unwrap_or(false)
    }

    /// Drop the cached entry so the next `get` fetches.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
        debug!("JWKS cache invalidated");
    }

    async fn current(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    fn is_live(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    async fn fetch(&self) -> Result<KeySet, FetchError> {
        let jwks = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))??;

        let keys = KeySet::from_jwks(&jwks);
        if keys.is_empty() {
            // Cached anyway; every token then fails the key lookup
            warn!("JWKS document from upstream contains no usable keys");
        }
        Ok(keys)
    }
}
