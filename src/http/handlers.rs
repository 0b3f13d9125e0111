//! Public API handlers.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cache::CacheStatsSnapshot;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::{BreakerStatus, CircuitState};

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub dimensions: usize,
    /// Served from cache without calling the upstream.
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    /// "ok" while the breaker is closed, "degraded" otherwise.
    pub status: String,
    pub breaker: BreakerStatus,
    pub cache: CacheStatsSnapshot,
}

/// `POST /v1/embeddings`
pub async fn embed_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EmbedRequest>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    if request.text.trim().is_empty() {
        metrics::record_request("embeddings", StatusCode::BAD_REQUEST.as_u16(), start);
        return ApiError::bad_request("text must not be empty").into_response();
    }

    match state.ctx.embed(&request.text).await {
        Ok(lookup) => {
            tracing::debug!(
                request_id = %request_id,
                cached = lookup.cached,
                dimensions = lookup.value.len(),
                "Embedding served"
            );
            metrics::record_request("embeddings", StatusCode::OK.as_u16(), start);
            Json(EmbedResponse {
                dimensions: lookup.value.len(),
                embedding: lookup.value.to_vec(),
                cached: lookup.cached,
            })
            .into_response()
        }
        Err(err) => {
            let api_error = ApiError::from(err);
            tracing::warn!(
                request_id = %request_id,
                status = %api_error.status,
                error = %api_error.message,
                "Embedding request failed"
            );
            metrics::record_request("embeddings", api_error.status.as_u16(), start);
            api_error.into_response()
        }
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    let breaker = state.ctx.embeddings.breaker().status();
    let status = if breaker.state == CircuitState::Closed {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthReport {
        status: status.to_string(),
        breaker,
        cache: state.ctx.embeddings.stats(),
    })
}
