// =============================================================================
// QuoteLab — Main Entry Point
// =============================================================================
//
// Single-user market analysis backend: fetches OHLCV history from the
// provider, augments it with technical indicators, derives performance and
// risk metrics, and serves both as JSON and CSV to a dashboard frontend.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod cache;
mod dates;
mod export;
mod indicators;
mod metrics;
mod provider;
mod runtime_config;
mod series;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "quotelab.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("QuoteLab analysis backend starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Env overrides for containerized runs.
    if let Ok(addr) = std::env::var("QUOTELAB_BIND") {
        config.bind_addr = addr;
    }
    if let Ok(port) = std::env::var("QUOTELAB_PORT") {
        config.port = port
            .parse()
            .context("QUOTELAB_PORT must be a valid port number")?;
    }

    // ── 2. Shared state & router ─────────────────────────────────────────
    let bind = format!("{}:{}", config.bind_addr, config.port);
    let state = Arc::new(AppState::new(config));
    let app = api::rest::router(state);

    // ── 3. Serve ─────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "API server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
