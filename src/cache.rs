//! In-memory TTL cache for aggregated search results.
//!
//! Caches the final deduplicated, capped result set keyed by the
//! normalised query. Uses [`moka`] for async-friendly caching with
//! automatic eviction. Each aggregator owns its cache instance; there is
//! no process-global cache.

use std::time::Duration;

use moka::future::Cache;

use crate::types::SearchResult;

/// Maximum number of cached result sets per aggregator.
const MAX_CACHE_ENTRIES: u64 = 100;

/// TTL cache of aggregated results, keyed by normalised query.
pub(crate) struct QueryCache {
    inner: Cache<String, Vec<SearchResult>>,
}

impl QueryCache {
    pub(crate) fn new(ttl_seconds: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build(),
        }
    }

    pub(crate) async fn get(&self, query: &str) -> Option<Vec<SearchResult>> {
        self.inner.get(&normalise(query)).await
    }

    pub(crate) async fn insert(&self, query: &str, results: Vec<SearchResult>) {
        self.inner.insert(normalise(query), results).await;
    }
}

/// Lowercased, trimmed query: "Moon Landing " and "moon landing" share
/// one cache entry.
fn normalise(query: &str) -> String {
    query.trim().to_lowercase()
}
