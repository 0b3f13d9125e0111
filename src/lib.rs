//! Upstream guard library.
//!
//! Fault isolation and caching in front of an external embedding API: a
//! bounded LRU cache, a per-dependency circuit breaker, and the call path
//! that combines them.

pub mod admin;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use cache::{BoundedLruCache, CacheStats};
pub use config::GuardConfig;
pub use http::HttpServer;
pub use lifecycle::{AppContext, Shutdown};
pub use resilience::{CallError, CircuitBreaker, ResilientCall};
