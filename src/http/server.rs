//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and stop on the shutdown signal

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::handlers::{embed_handler, health_handler};
use crate::lifecycle::shutdown;
use crate::lifecycle::AppContext;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
}

/// Public HTTP server: embedding API and health endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let request_timeout = Duration::from_secs(ctx.config.listener.request_timeout_secs);
        let router = Self::build_router(AppState { ctx }, request_timeout);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/v1/embeddings", post(embed_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        serve(listener, self.router, shutdown, "HTTP server").await
    }
}

/// Serve `router` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: broadcast::Receiver<()>,
    label: &'static str,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "{} starting", label);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::wait(shutdown))
        .await?;

    tracing::info!("{} stopped", label);
    Ok(())
}
