use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration errors. Any of these aborts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Supabase project URL, without trailing slash
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwks_cache_ttl_secs: u64,
    pub jwks_fetch_timeout_secs: u64,
    /// Keep serving the last good key set when a refresh fails
    pub jwks_serve_stale: bool,
    /// Only checked when set; Supabase issues "authenticated"
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn jwks_url(&self) -> String {
        format!("{}/auth/v1/.well-known/jwks.json", self.supabase_url)
    }

    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn jwks_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_fetch_timeout_secs)
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    ///
    /// Call once at startup (after `.env` files are loaded) and share the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let supabase_url = required(&lookup, "SUPABASE_URL")?;
        url::Url::parse(&supabase_url).map_err(|_| ConfigError::Invalid {
            name: "SUPABASE_URL",
            value: supabase_url.clone(),
        })?;

        let auth = AuthConfig {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: required(&lookup, "SUPABASE_ANON_KEY")?,
            jwks_cache_ttl_secs: 60 * 60,
            jwks_fetch_timeout_secs: 10,
            jwks_serve_stale: true,
            audience: None,
            leeway_secs: 0,
        };

        let database = DatabaseConfig {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections: 10,
            connection_timeout: 30,
        };

        let server = ServerConfig {
            port: 8080,
            enable_cors: true,
        };

        let config = Self {
            environment,
            server,
            database,
            auth,
        };

        // Environment defaults first, then specific env vars win
        let config = match environment {
            Environment::Production => config.production(),
            Environment::Staging => config.staging(),
            Environment::Development => config,
        };

        config.with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = parse(&v, "PORT")?;
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.server.enable_cors = parse(&v, "SECURITY_ENABLE_CORS")?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse(&v, "DATABASE_MAX_CONNECTIONS")?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse(&v, "DATABASE_CONNECTION_TIMEOUT")?;
        }

        // Auth overrides
        if let Some(v) = lookup("JWKS_CACHE_TTL_SECS") {
            self.auth.jwks_cache_ttl_secs = parse(&v, "JWKS_CACHE_TTL_SECS")?;
        }
        if let Some(v) = lookup("JWKS_FETCH_TIMEOUT_SECS") {
            self.auth.jwks_fetch_timeout_secs = parse(&v, "JWKS_FETCH_TIMEOUT_SECS")?;
        }
        if let Some(v) = lookup("JWKS_SERVE_STALE") {
            self.auth.jwks_serve_stale = parse(&v, "JWKS_SERVE_STALE")?;
        }
        if let Some(v) = lookup("SUPABASE_JWT_AUDIENCE") {
            let v = v.trim().to_string();
            self.auth.audience = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = lookup("JWT_LEEWAY_SECS") {
            self.auth.leeway_secs = parse(&v, "JWT_LEEWAY_SECS")?;
        }

        if self.auth.jwks_fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "JWKS_FETCH_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(self)
    }

    fn staging(mut self) -> Self {
        self.database.max_connections = 20;
        self.database.connection_timeout = 10;
        self
    }

    fn production(mut self) -> Self {
        self.database.max_connections = 50;
        self.database.connection_timeout = 5;
        self.server.enable_cors = false;
        self
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment, Environment::Development)
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse<T: std::str::FromStr>(value: &str, name: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
