//! Named circuit breakers, one per protected dependency.

use dashmap::DashMap;
use std::sync::Arc;

use crate::resilience::circuit_breaker::{BreakerConfig, BreakerStatus, CircuitBreaker};
use crate::resilience::clock::{Clock, SystemClock};

/// Owns every breaker in the process, keyed by dependency name.
///
/// Breakers are created lazily on first use with the registry's shared
/// settings and clock, and live as long as the registry.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
            clock,
        }
    }

    /// Fetch the breaker for `name`, creating it if needed.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.value().clone();
        }

        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(dependency = %name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::with_clock(
                    name,
                    self.config.clone(),
                    self.clock.clone(),
                ))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Status of every breaker, sorted by name.
    pub fn statuses(&self) -> Vec<BreakerStatus> {
        let mut statuses: Vec<_> = self.breakers.iter().map(|r| r.value().status()).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Reset one breaker. Returns false if no breaker has that name.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        for r in self.breakers.iter() {
            r.value().reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
