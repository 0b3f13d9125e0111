use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::CacheStatsSnapshot;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::BreakerStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub instance_id: Uuid,
    pub uptime_secs: u64,
    pub dependency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheReport {
    pub capacity: usize,
    #[serde(flatten)]
    pub stats: CacheStatsSnapshot,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.ctx.instance_id,
        uptime_secs: state.ctx.started_at.elapsed().as_secs(),
        dependency: state.ctx.upstream.dependency_name().to_string(),
    })
}

pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerStatus>> {
    Json(state.ctx.breakers.statuses())
}

pub async fn reset_breaker(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    if state.ctx.breakers.reset(&name) {
        tracing::info!(dependency = %name, "Breaker reset via admin API");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheReport> {
    Json(CacheReport {
        capacity: state.ctx.embeddings.cache().capacity(),
        stats: state.ctx.embeddings.stats(),
    })
}

pub async fn reset_cache_stats(State(state): State<AppState>) -> StatusCode {
    state.ctx.embeddings.reset_stats();
    tracing::info!("Cache stats reset via admin API");
    StatusCode::NO_CONTENT
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.ctx.embeddings.cache().clear();
    metrics::record_cache_size(0);
    tracing::info!("Cache cleared via admin API");
    StatusCode::NO_CONTENT
}
