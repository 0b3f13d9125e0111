//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use upstream_guard::admin::setup_admin_router;
use upstream_guard::config::GuardConfig;
use upstream_guard::http::server::serve;
use upstream_guard::http::{AppState, HttpServer};
use upstream_guard::lifecycle::{AppContext, Shutdown};
use upstream_guard::resilience::Clock;

/// Read one HTTP/1.1 request and return its body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&buf[header_end..]).into_owned()
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives the request body and returns `(status, body)`.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request_body = read_request(&mut socket).await;
                        let (status, body) = f(request_body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// OpenAI-style embeddings response body.
pub fn embedding_body(values: &[f32]) -> String {
    serde_json::json!({
        "object": "list",
        "data": [{ "object": "embedding", "index": 0, "embedding": values }],
        "model": "test-model",
    })
    .to_string()
}

/// Config pointing at `upstream`, with metrics off and admin on.
pub fn test_config(upstream: SocketAddr) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.url = format!("http://{}/v1/embeddings", upstream);
    config.upstream.timeout_ms = 2_000;
    config.observability.metrics_enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".to_string();
    config.admin.bind_address = "127.0.0.1:0".to_string();
    config
}

/// A running guard: public and admin listeners plus its context.
pub struct RunningGuard {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub ctx: Arc<AppContext>,
    pub shutdown: Shutdown,
}

impl RunningGuard {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

/// Start the guard with `config`, using `clock` for breaker time.
pub async fn start_guard(config: GuardConfig, clock: Arc<dyn Clock>) -> RunningGuard {
    let ctx = Arc::new(AppContext::with_clock(config, clock).unwrap());
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(ctx.clone());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let router = setup_admin_router(AppState { ctx: ctx.clone() });
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = serve(admin_listener, router, rx, "Admin API").await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningGuard {
        addr,
        admin_addr,
        ctx,
        shutdown,
    }
}
