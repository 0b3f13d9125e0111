//! Embedding API client with timeout and error handling.
//!
//! # Responsibilities
//! - POST text to the embeddings endpoint
//! - Enforce the per-call deadline (the circuit breaker does not)
//! - Classify failures so callers can tell rate limits from outages

use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::upstream::types::{EmbeddingRequest, EmbeddingResponse, UpstreamConfig, UpstreamError};

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    url: Url,
    config: UpstreamConfig,
    timeout_duration: Duration,
}

impl EmbeddingClient {
    /// Create a new client.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let url = Url::parse(&config.url).map_err(|e| UpstreamError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder().build()?;

        tracing::info!(
            url = %url,
            model = %config.model,
            timeout_ms = config.timeout_ms,
            "Embedding client initialized"
        );

        Ok(Self {
            http,
            url,
            timeout_duration: Duration::from_millis(config.timeout_ms),
            config,
        })
    }

    pub fn dependency_name(&self) -> &str {
        &self.config.dependency_name
    }

    /// Request the embedding for `text`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        match timeout(self.timeout_duration, self.send(text)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.config.timeout_ms, "Embedding request timed out");
                Err(UpstreamError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                })
            }
        }
    }

    async fn send(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };
        let mut request = self.http.post(self.url.clone()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Embedding request rejected by upstream");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(UpstreamError::EmptyResponse)
    }
}
