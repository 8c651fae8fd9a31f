// =============================================================================
// Response Cache — TTL memoization of fetch results
// =============================================================================
//
// An explicit, injected cache object (held in AppState) rather than a
// process-wide global, so tests can construct and clear their own instance.
// Entries are keyed by (operation name, ordered argument list) and lazily
// expired: a stale entry is treated as absent and overwritten by the next
// successful fetch.  Failed fetches are never cached.
//
// The TTL is a per-call parameter; passing `Duration::ZERO` forces every call
// to re-fetch, which is how the expiry path is exercised deterministically in
// tests.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::fetch::FetchError;

/// Cache key: operation name plus its ordered arguments.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub operation: &'static str,
    pub args: Vec<String>,
}

impl CacheKey {
    pub fn new(operation: &'static str, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            operation,
            args: args.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.operation, self.args.join(","))
    }
}

struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

/// Time-to-live memoization of fetch results.
///
/// No eviction beyond lazy overwrite-on-refetch and no bound on distinct
/// keys; key cardinality is a handful of symbols and windows per session.
pub struct TtlCache<T: Clone> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if fetched within `ttl`; otherwise
    /// invoke `fetch`, store the result on success, and return it.  Failures
    /// propagate to the caller and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        // Lookup under a short read lock; never hold the lock across an await.
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < ttl {
                    debug!(key = %key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }
        }

        debug!(key = %key, "cache miss — fetching");
        let value = fetch().await?;

        self.entries.write().insert(
            key,
            CacheEntry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
