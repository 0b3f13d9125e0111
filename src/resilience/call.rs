//! Cache-then-breaker call path.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{BoundedLruCache, CacheStats, CacheStatsSnapshot};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::CallError;

/// A value produced by [`ResilientCall::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    pub value: V,
    /// True when served from the cache without calling the dependency.
    pub cached: bool,
}

/// Canonical cache key for a text input.
///
/// Trims, lowercases and collapses runs of whitespace so trivially different
/// spellings of the same text share one entry.
pub fn normalize_key(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Combines a cache domain with the breaker of the dependency that fills it.
///
/// A cache hit never reaches the breaker, so it counts neither as success
/// nor as failure. Failures are returned as-is; choosing a fallback is the
/// caller's job.
#[derive(Debug)]
pub struct ResilientCall<V> {
    cache: Arc<BoundedLruCache<String, V>>,
    stats: Arc<CacheStats>,
    breaker: Arc<CircuitBreaker>,
}

impl<V> Clone for ResilientCall<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            stats: self.stats.clone(),
            breaker: self.breaker.clone(),
        }
    }
}

impl<V: Clone> ResilientCall<V> {
    pub fn new(
        cache: Arc<BoundedLruCache<String, V>>,
        stats: Arc<CacheStats>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            cache,
            stats,
            breaker,
        }
    }

    /// Serve `input` from the cache, or compute it with `operation` through
    /// the breaker and cache the result.
    pub async fn call<F, Fut, E>(&self, input: &str, operation: F) -> Result<Lookup<V>, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = normalize_key(input);

        if let Some(value) = self.cache.get(&key) {
            self.stats.record_hit();
            return Ok(Lookup {
                value,
                cached: true,
            });
        }
        self.stats.record_miss();

        let value = self.breaker.execute(operation).await?;

        if self.cache.set(key, value.clone()).is_some() {
            metrics::record_cache_eviction();
        }
        metrics::record_cache_size(self.cache.len());

        Ok(Lookup {
            value,
            cached: false,
        })
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn cache(&self) -> &Arc<BoundedLruCache<String, V>> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.cache.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::circuit_breaker::{BreakerConfig, CircuitState};

    fn resilient(max_size: usize, failure_threshold: u32) -> ResilientCall<u64> {
        let breaker = CircuitBreaker::new(
            "test",
            BreakerConfig {
                failure_threshold,
                ..BreakerConfig::default()
            },
        );
        ResilientCall::new(
            Arc::new(BoundedLruCache::new(max_size)),
            Arc::new(CacheStats::new()),
            Arc::new(breaker),
        )
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Cozy   Studio\nnear Campus "), "cozy studio near campus");
        assert_eq!(normalize_key(""), "");
    }

    #[tokio::test]
    async fn test_variants_share_entry() {
        let call = resilient(8, 5);
        let first = call.call("Two Bedroom", || async { Ok::<_, ()>(2) }).await.unwrap();
        let second = call.call("two   bedroom ", || async { Ok::<_, ()>(99) }).await.unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.value, 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let call = resilient(8, 5);
        let err = call.call("x", || async { Err::<u64, _>("nope") }).await.unwrap_err();
        assert_eq!(err.into_operation(), Some("nope"));
        assert!(!call.cache().has("x"));
        assert_eq!(call.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_hits_bypass_open_breaker() {
        let call = resilient(8, 1);
        call.call("cached", || async { Ok::<_, &str>(1) }).await.unwrap();
        let _ = call.call("other", || async { Err::<u64, _>("down") }).await;
        assert_eq!(call.breaker().state(), CircuitState::Open);

        let hit = call.call("cached", || async { Ok::<_, &str>(2) }).await.unwrap();
        assert!(hit.cached);
        assert_eq!(hit.value, 1);

        let miss = call.call("fresh", || async { Ok::<_, &str>(3) }).await.unwrap_err();
        assert!(miss.is_open());
    }
}
