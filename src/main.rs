// =============================================================================
// market-pulse — market dashboard data pipeline service
// =============================================================================
//
// Fetches FX, equity, and crypto data from public REST sources, normalizes
// everything into one canonical time-indexed series shape, computes derived
// indicator columns and a bounded buy/sell strength score, and serves the lot
// over a small REST API with TTL-cached upstream responses.

mod api;
mod app_state;
mod cache;
mod fetch;
mod indicators;
mod normalize;
mod runtime_config;
mod series;
mod strength;
mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::fetch::MarketClient;
use crate::runtime_config::{RuntimeConfig, CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match RuntimeConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "runtime config unavailable, starting with defaults");
            RuntimeConfig::default()
        }
    };

    // Environment overrides take precedence over the config file.
    if let Ok(addr) = std::env::var("PULSE_BIND_ADDR") {
        config.bind_addr = addr;
    }
    let api_key = std::env::var("ALPHAVANTAGE_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("ALPHAVANTAGE_KEY not set; FX and equity sources will report unreachable");
    }

    let market_client = MarketClient::new(&config, api_key);
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, market_client));

    let app = api::rest::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, version = env!("CARGO_PKG_VERSION"), "market-pulse listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.runtime_config.read().save(CONFIG_PATH)?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
