// =============================================================================
// Runtime Configuration — dashboard pipeline settings
// =============================================================================
//
// Every tunable parameter of the service lives here.  Persistence uses an
// atomic tmp + rename pattern to prevent corruption on crash.  All fields
// carry `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default on-disk location of the runtime config.
pub const CONFIG_PATH: &str = "runtime_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3002".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_market_listing_count() -> usize {
    10
}

fn default_stablecoin_denylist() -> Vec<String> {
    // Fiat-pegged tokens by upstream id: the strength score is meaningless
    // for assets pegged 1:1 to a fiat currency.
    vec![
        "tether".to_string(),
        "usd-coin".to_string(),
        "binance-usd".to_string(),
        "dai".to_string(),
        "true-usd".to_string(),
        "first-digital-usd".to_string(),
        "paxos-standard".to_string(),
    ]
}

fn default_indicator_window() -> usize {
    14
}

fn default_strength_window() -> usize {
    crate::strength::DEFAULT_STRENGTH_WINDOW
}

fn default_bollinger_k() -> f64 {
    2.0
}

fn default_crossover_short_window() -> usize {
    20
}

fn default_crossover_long_window() -> usize {
    50
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_alpha_vantage_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

fn default_coingecko_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the market-pulse service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Service ------------------------------------------------------------

    /// Address the REST API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Time-to-live for cached fetch results, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upstream HTTP request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Market listing -----------------------------------------------------

    /// How many top assets by market cap the listing fetch requests.
    #[serde(default = "default_market_listing_count")]
    pub market_listing_count: usize,

    /// Upstream asset ids excluded from the listing (fiat-pegged tokens).
    #[serde(default = "default_stablecoin_denylist")]
    pub stablecoin_denylist: Vec<String>,

    /// Quote currency for the crypto sources.
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    // --- Indicator defaults -------------------------------------------------

    /// Default window for SMA / Bollinger / RSI when a request omits one.
    #[serde(default = "default_indicator_window")]
    pub indicator_window: usize,

    /// Trailing window for the buy/sell strength score.
    #[serde(default = "default_strength_window")]
    pub strength_window: usize,

    /// Bollinger band width in standard deviations.
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,

    /// Default short window for the dual-SMA crossover.
    #[serde(default = "default_crossover_short_window")]
    pub crossover_short_window: usize,

    /// Default long window for the dual-SMA crossover.
    #[serde(default = "default_crossover_long_window")]
    pub crossover_long_window: usize,

    // --- Upstream endpoints -------------------------------------------------
    // Overridable so a deployment can point at a proxy or a test double.

    #[serde(default = "default_alpha_vantage_base_url")]
    pub alpha_vantage_base_url: String,

    #[serde(default = "default_coingecko_base_url")]
    pub coingecko_base_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            market_listing_count: default_market_listing_count(),
            stablecoin_denylist: default_stablecoin_denylist(),
            vs_currency: default_vs_currency(),
            indicator_window: default_indicator_window(),
            strength_window: default_strength_window(),
            bollinger_k: default_bollinger_k(),
            crossover_short_window: default_crossover_short_window(),
            crossover_long_window: default_crossover_long_window(),
            alpha_vantage_base_url: default_alpha_vantage_base_url(),
            coingecko_base_url: default_coingecko_base_url(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            cache_ttl_secs = config.cache_ttl_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
