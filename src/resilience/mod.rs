//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external dependency:
//!     → call.rs (normalize key, consult cache)
//!     → On miss: circuit_breaker.rs (fail fast if open, else run the operation)
//!     → On success: result cached, failure count reset
//!     → On failure: failure counted, original error returned to the caller
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, owned by registry.rs
//! - Timeouts belong to the operation, not the breaker
//! - No retries or fallbacks here; callers decide
//! - Time is injected through clock.rs so cooldowns are testable

pub mod call;
pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod registry;

pub use call::{normalize_key, Lookup, ResilientCall};
pub use circuit_breaker::{BreakerStatus, CircuitBreaker, CircuitState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BreakerOpenError, CallError};
pub use registry::BreakerRegistry;
