//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_breaker_state` (gauge): 0=closed, 1=half-open, 2=open, by dependency
//! - `guard_breaker_transitions_total` (counter): by dependency, from, to
//! - `guard_breaker_rejections_total` (counter): calls refused while open
//! - `guard_cache_hits_total` / `guard_cache_misses_total` (counters)
//! - `guard_cache_evictions_total` (counter), `guard_cache_size` (gauge)
//! - `guard_requests_total` (counter): by route, status
//! - `guard_request_duration_seconds` (histogram): by route
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

fn state_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

pub fn record_breaker_state(dependency: &str, state: CircuitState) {
    gauge!("guard_breaker_state", "dependency" => dependency.to_string()).set(state_value(state));
}

pub fn record_breaker_transition(dependency: &str, from: CircuitState, to: CircuitState) {
    counter!(
        "guard_breaker_transitions_total",
        "dependency" => dependency.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(dependency, to);
}

pub fn record_breaker_rejection(dependency: &str) {
    counter!("guard_breaker_rejections_total", "dependency" => dependency.to_string()).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("guard_cache_hits_total").increment(1);
    } else {
        counter!("guard_cache_misses_total").increment(1);
    }
}

pub fn record_cache_eviction() {
    counter!("guard_cache_evictions_total").increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("guard_cache_size").set(size as f64);
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("guard_requests_total", "route" => route, "status" => status.to_string()).increment(1);
    histogram!("guard_request_duration_seconds", "route" => route).record(start.elapsed().as_secs_f64());
}
