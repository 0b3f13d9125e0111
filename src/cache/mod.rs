//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup by normalized key:
//!     → lru.rs (bounded map, recency order, eviction)
//!     → stats.rs (hit/miss counters for dashboards)
//! ```
//!
//! # Design Decisions
//! - Capacity bound only; no per-entry TTL
//! - `has()` observes without touching recency
//! - Stats are per cache domain and owned by the application context

pub mod lru;
pub mod stats;

pub use lru::BoundedLruCache;
pub use stats::{CacheStats, CacheStatsSnapshot};
