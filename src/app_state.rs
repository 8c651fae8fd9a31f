// =============================================================================
// Application State — shared service context
// =============================================================================
//
// Everything the REST handlers need, behind a single `Arc<AppState>`.  Hot
// shared pieces use `parking_lot::RwLock`; locks are never held across an
// await point.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::cache::TtlCache;
use crate::fetch::MarketClient;
use crate::runtime_config::RuntimeConfig;
use crate::series::PriceSeries;
use crate::types::{CoinSummary, ErrorRecord};

/// Upper bound on the retained error history.
const MAX_RECENT_ERRORS: usize = 50;

/// Shared application state handed to every request handler.
pub struct AppState {
    /// Bumped on every config mutation so clients can detect staleness.
    state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub market_client: MarketClient,

    /// TTL cache for normalized price series, keyed by operation + args.
    pub series_cache: TtlCache<PriceSeries>,
    /// TTL cache for the market listing.
    pub listing_cache: TtlCache<Vec<CoinSummary>>,

    /// Ring of the most recent upstream failures, newest last.
    recent_errors: RwLock<Vec<ErrorRecord>>,

    start_time: Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, market_client: MarketClient) -> Self {
        Self {
            state_version: AtomicU64::new(0),
            runtime_config: Arc::new(RwLock::new(config)),
            market_client,
            series_cache: TtlCache::new(),
            listing_cache: TtlCache::new(),
            recent_errors: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// The configured cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.runtime_config.read().cache_ttl_secs)
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Record an upstream failure, evicting the oldest beyond the cap.
    pub fn push_error(&self, record: ErrorRecord) {
        let mut errors = self.recent_errors.write();
        errors.push(record);
        if errors.len() > MAX_RECENT_ERRORS {
            let excess = errors.len() - MAX_RECENT_ERRORS;
            errors.drain(..excess);
        }
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_state() -> AppState {
        let config = RuntimeConfig::default();
        let client = MarketClient::new(&config, None);
        AppState::new(config, client)
    }

    fn error_record(message: &str) -> ErrorRecord {
        ErrorRecord {
            message: message.to_string(),
            kind: Some("unreachable".to_string()),
            at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn state_version_starts_at_zero_and_increments() {
        let state = test_state();
        assert_eq!(state.current_state_version(), 0);
        assert_eq!(state.increment_version(), 1);
        assert_eq!(state.increment_version(), 2);
        assert_eq!(state.current_state_version(), 2);
    }

    #[test]
    fn error_history_is_capped() {
        let state = test_state();
        for i in 0..(MAX_RECENT_ERRORS + 10) {
            state.push_error(error_record(&format!("failure {i}")));
        }
        let errors = state.recent_errors();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        // Oldest entries were evicted, newest kept.
        assert_eq!(errors.last().unwrap().message, "failure 59");
        assert_eq!(errors.first().unwrap().message, "failure 10");
    }

    #[test]
    fn cache_ttl_follows_config() {
        let state = test_state();
        assert_eq!(state.cache_ttl(), Duration::from_secs(600));
        state.runtime_config.write().cache_ttl_secs = 5;
        assert_eq!(state.cache_ttl(), Duration::from_secs(5));
    }
}
