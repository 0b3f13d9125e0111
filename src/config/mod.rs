//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → read once by the startup code to build breakers, cache, upstream client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breakers never re-read it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BreakerConfig, CacheConfig, GuardConfig, ListenerConfig, ObservabilityConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
