use axum::{
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{HttpJwksSource, JwksSource, KeySetCache, SupabaseAuthClient, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, NoteStore, PgNoteStore};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwks: Arc<KeySetCache>,
    pub verifier: Arc<TokenVerifier>,
    pub notes: Arc<dyn NoteStore>,
    pub auth_client: Arc<SupabaseAuthClient>,
}

impl AppState {
    /// Wire the state from explicit collaborators. `http` is shared by the
    /// auth provider client and, in production, the JWKS source.
    pub fn new(
        config: AppConfig,
        notes: Arc<dyn NoteStore>,
        jwks_source: Arc<dyn JwksSource>,
        http: reqwest::Client,
    ) -> Self {
        let jwks = KeySetCache::new(jwks_source)
            .with_ttl(config.auth.jwks_cache_ttl())
            .with_fetch_timeout(config.auth.jwks_fetch_timeout())
            .with_serve_stale(config.auth.jwks_serve_stale);

        Self {
            verifier: Arc::new(TokenVerifier::new(&config.auth)),
            auth_client: Arc::new(SupabaseAuthClient::new(http, &config.auth)),
            jwks: Arc::new(jwks),
            notes,
            config: Arc::new(config),
        }
    }

    /// Production wiring: Postgres note store and the provider's JWKS endpoint.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let pool = DatabaseManager::connect(&config.database)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("notes-api-rust/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let jwks_source = HttpJwksSource::new(
            http.clone(),
            config.auth.jwks_url(),
            config.auth.jwks_fetch_timeout(),
        );
        tracing::info!("Verifying tokens against {}", jwks_source.url());

        Ok(Self::new(
            config,
            Arc::new(PgNoteStore::new(pool)),
            Arc::new(jwks_source),
            http,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = if state.config.server.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::notes;

    Router::new()
        .route("/auth/whoami", get(protected::whoami))
        .route("/notes", get(notes::notes_get).post(notes::notes_post))
        .route("/notes/search", get(notes::notes_search))
        .route(
            "/notes/:id",
            get(notes::note_get)
                .put(notes::note_put)
                .delete(notes::note_delete),
        )
        // route_layer: unknown paths stay 404 instead of 401
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Notes API (Rust)",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/signup, /auth/signin (public - token acquisition)",
                "whoami": "/auth/whoami (protected)",
                "notes": "/notes[/:id], /notes/search?q= (protected)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let jwks_cached = state.jwks.is_fresh().await;

    match state.notes.health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "jwks_cached": jwks_cached
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "jwks_cached": jwks_cached
                    }
                })),
            )
        }
    }
}
