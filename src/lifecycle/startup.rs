//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every long-lived component from a validated config
//! - Own them in one place (`AppContext`) and hand out `Arc` handles
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Breakers, cache and stats are explicit instances, never module globals

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::{BoundedLruCache, CacheStats};
use crate::config::GuardConfig;
use crate::resilience::{BreakerRegistry, CallError, Clock, Lookup, ResilientCall, SystemClock};
use crate::upstream::{Embedding, EmbeddingClient, UpstreamError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Composition root: everything the request handlers share.
#[derive(Debug)]
pub struct AppContext {
    pub config: GuardConfig,
    pub instance_id: Uuid,
    pub started_at: Instant,
    pub breakers: BreakerRegistry,
    pub upstream: EmbeddingClient,
    pub embeddings: ResilientCall<Embedding>,
}

impl AppContext {
    pub fn build(config: GuardConfig) -> Result<Self, StartupError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`build`](Self::build) but with an explicit breaker clock.
    pub fn with_clock(config: GuardConfig, clock: Arc<dyn Clock>) -> Result<Self, StartupError> {
        let upstream = EmbeddingClient::new(config.upstream.clone())?;
        let breakers = BreakerRegistry::with_clock(config.breaker.clone(), clock);
        let breaker = breakers.get_or_create(upstream.dependency_name());

        let cache = Arc::new(BoundedLruCache::new(config.cache.max_size));
        let embeddings = ResilientCall::new(cache, Arc::new(CacheStats::new()), breaker);

        let instance_id = Uuid::new_v4();
        tracing::info!(
            instance_id = %instance_id,
            dependency = %upstream.dependency_name(),
            failure_threshold = config.breaker.failure_threshold,
            cooldown_ms = config.breaker.cooldown_ms,
            success_threshold = config.breaker.success_threshold,
            cache_max_size = config.cache.max_size,
            "Application context ready"
        );

        Ok(Self {
            config,
            instance_id,
            started_at: Instant::now(),
            breakers,
            upstream,
            embeddings,
        })
    }

    /// Embed `text` through the cache and the upstream's breaker.
    pub async fn embed(&self, text: &str) -> Result<Lookup<Embedding>, CallError<UpstreamError>> {
        self.embeddings
            .call(text, || async {
                self.upstream.embed(text).await.map(Embedding::from)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;

    #[test]
    fn test_build_registers_upstream_breaker() {
        let ctx = AppContext::build(GuardConfig::default()).unwrap();
        let breaker = ctx.breakers.get("embeddings").unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(ctx.embeddings.cache().capacity(), 1000);
        assert!(Arc::ptr_eq(&breaker, ctx.embeddings.breaker()));
    }

    #[test]
    fn test_build_fails_on_bad_upstream_url() {
        let mut config = GuardConfig::default();
        config.upstream.url = "::nope::".to_string();
        assert!(matches!(AppContext::build(config), Err(StartupError::Upstream(_))));
    }
}
