//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID for log correlation)
//!     → handlers.rs (embedding API, health)
//!         → AppContext::embed (cache → breaker → upstream)
//!     → response.rs (map breaker/upstream errors to status codes)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
