//! Upstream wire types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export UpstreamConfig from config module to avoid duplication
pub use crate::config::schema::UpstreamConfig;

/// An embedding vector. Shared so cache hits don't copy the floats.
pub type Embedding = std::sync::Arc<[f32]>;

/// Request body for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Response body of an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

/// Errors that can occur when calling the embedding API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The configured URL could not be parsed.
    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No response within the deadline.
    #[error("upstream timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Connection, TLS or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("could not decode upstream response: {0}")]
    Decode(String),

    /// Response decoded but held no embedding.
    #[error("upstream returned no embedding")]
    EmptyResponse,
}

impl UpstreamError {
    /// True for HTTP 429 from the upstream.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 429, .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            UpstreamError::Timeout { .. } => true,
            UpstreamError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}
