//! Upstream embedding API.
//!
//! The dependency the guard exists to protect. Every call made here is
//! wrapped by the resilient call path; this module only knows how to talk
//! HTTP to the provider and how to describe what went wrong.

pub mod client;
pub mod types;

pub use client::EmbeddingClient;
pub use types::{Embedding, UpstreamError};
