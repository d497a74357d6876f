use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notes_api_rust::{config::AppConfig, router, AppState};

#[derive(Debug, Parser)]
#[command(name = "notes-api-rust", version, about = "Note-taking API backed by Supabase Auth")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long, env = "NOTES_API_PORT")]
    port: Option<u16>,

    /// Env file loaded before .env.local and .env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Earlier files win; variables already in the process environment win over all
    let mut loaded = Vec::new();
    if let Some(path) = &args.env_file {
        dotenvy::from_path(path)?;
        loaded.push(path.display().to_string());
    }
    for name in [".env.local", ".env"] {
        if dotenvy::from_filename(name).is_ok() {
            loaded.push(name.to_string());
        }
    }

    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let default_filter = if config.is_development() {
        "info,notes_api_rust=debug,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if loaded.is_empty() {
        tracing::warn!("No .env.local or .env file found, using system environment variables");
    } else {
        tracing::debug!("Loaded env files: {}", loaded.join(", "));
    }
    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
