//! Upstream guard service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────────────────────────────────┐
//!                    │                   UPSTREAM GUARD                     │
//!  POST              │  ┌─────────┐   ┌───────────┐   ┌─────────────────┐  │
//!  /v1/embeddings ───┼─▶│  http   │──▶│ LRU cache │──▶│ circuit breaker │──┼──▶ Embedding API
//!                ◀───┼──│ handler │◀──│  (hit)    │◀──│   + timeout     │◀─┼───
//!                    │  └─────────┘   └───────────┘   └─────────────────┘  │
//!                    │                                                      │
//!                    │  ┌──────────┐  ┌───────────────┐  ┌─────────────┐   │
//!                    │  │  config  │  │ observability │  │  admin API  │   │
//!                    │  └──────────┘  └───────────────┘  └─────────────┘   │
//!                    └─────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use upstream_guard::admin::setup_admin_router;
use upstream_guard::config::{load_config, GuardConfig};
use upstream_guard::http::server::serve;
use upstream_guard::http::{AppState, HttpServer};
use upstream_guard::lifecycle::{signals, AppContext, Shutdown};
use upstream_guard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "upstream-guard")]
#[command(about = "Cache and circuit breaker in front of an embedding API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("upstream-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<std::net::SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let ctx = Arc::new(AppContext::build(config.clone())?);
    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let router = setup_admin_router(AppState { ctx: ctx.clone() });
        let rx = shutdown.subscribe();
        Some(tokio::spawn(async move { serve(listener, router, rx, "Admin API").await }))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(ctx).run(listener, shutdown.subscribe()).await?;

    if let Some(task) = admin_task {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
