//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: probing whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: first call after cooldown elapsed (and that call is the probe)
//! Half-Open → Closed: success_count >= success_threshold
//! Half-Open → Open: any probe fails
//! ```
//!
//! # Design Decisions
//! - One breaker per protected dependency
//! - Fail fast in Open state; the operation is not invoked
//! - The operation's own error is returned unchanged
//! - The lock is never held across the operation's await point
//! - A call dropped mid-await records no outcome; a Half-Open breaker stays
//!   Half-Open and the next call probes again

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::error::{BreakerOpenError, CallError};

pub use crate::config::schema::BreakerConfig;

/// Operating mode of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic snapshot for dashboards and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub failure_threshold: u32,
    /// `None` until the first failure is recorded.
    pub time_since_last_failure_ms: Option<u64>,
    pub cooldown_ms: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<u64>,
}

impl BreakerInner {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
        }
    }
}

/// Gates calls to a fallible async dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker reading the system clock.
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    pub fn with_clock(name: impl Into<String>, config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            config,
            clock,
            inner: Mutex::new(BreakerInner::closed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Run `operation` through the breaker.
    ///
    /// In Open state the operation is only invoked once the cooldown has
    /// elapsed; that same call moves the breaker to Half-Open and serves as
    /// the probe. Otherwise the call fails with [`CallError::Open`].
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit()?;

        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(CallError::Operation(err))
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn status(&self) -> BreakerStatus {
        let inner = self.inner.lock();
        let now = self.clock.now_ms();
        BreakerStatus {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            failure_threshold: self.config.failure_threshold,
            time_since_last_failure_ms: inner.last_failure_time.map(|t| now.saturating_sub(t)),
            cooldown_ms: self.config.cooldown_ms,
        }
    }

    /// Force the breaker back to Closed with all counters zeroed.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;
        *inner = BreakerInner::closed();
        if previous != CircuitState::Closed {
            metrics::record_breaker_transition(&self.name, previous, CircuitState::Closed);
        }
        tracing::info!(dependency = %self.name, previous = %previous, "Circuit breaker reset");
    }

    fn admit(&self) -> Result<(), BreakerOpenError> {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let now = self.clock.now_ms();
        let elapsed = inner
            .last_failure_time
            .map_or(u64::MAX, |t| now.saturating_sub(t));

        if elapsed > self.config.cooldown_ms {
            inner.success_count = 0;
            self.transition(&mut inner, CircuitState::HalfOpen);
            return Ok(());
        }

        let retry_after_ms = self.config.cooldown_ms - elapsed;
        metrics::record_breaker_rejection(&self.name);
        tracing::debug!(
            dependency = %self.name,
            retry_after_ms,
            "Circuit open, rejecting call"
        );
        Err(BreakerOpenError {
            dependency: self.name.clone(),
            retry_after_ms,
        })
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen => {
                inner.failure_count = 0;
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.success_count = 0;
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            // A call admitted before another caller tripped the breaker.
            // Leave the Open state and its counters alone.
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_time = Some(self.clock.now_ms());

        match inner.state {
            CircuitState::HalfOpen => {
                inner.success_count = 0;
                inner.failure_count = inner.failure_count.max(self.config.failure_threshold);
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        metrics::record_breaker_transition(&self.name, from, to);

        match to {
            CircuitState::Open => tracing::warn!(
                dependency = %self.name,
                from = %from,
                failure_count = inner.failure_count,
                cooldown_ms = self.config.cooldown_ms,
                "Circuit breaker opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                dependency = %self.name,
                "Circuit breaker half-open, probing"
            ),
            CircuitState::Closed => tracing::info!(
                dependency = %self.name,
                "Circuit breaker closed, dependency recovered"
            ),
        }
    }
}
