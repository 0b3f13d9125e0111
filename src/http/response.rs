//! Error responses for the public API.
//!
//! Breaker rejections become 503 with `Retry-After`; upstream failures are
//! mapped by cause so clients can tell a rate limit from an outage.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::resilience::CallError;
use crate::upstream::UpstreamError;

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retry_after_ms: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retry_after_ms: None,
        }
    }
}

impl From<CallError<UpstreamError>> for ApiError {
    fn from(err: CallError<UpstreamError>) -> Self {
        match err {
            CallError::Open(open) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: open.to_string(),
                retry_after_ms: Some(open.retry_after_ms),
            },
            CallError::Operation(e) => {
                let status = if e.is_rate_limited() {
                    StatusCode::TOO_MANY_REQUESTS
                } else if e.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                Self {
                    status,
                    message: e.to_string(),
                    retry_after_ms: None,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            retry_after_ms: self.retry_after_ms,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(ms) = self.retry_after_ms {
            let secs = ms.div_ceil(1000).max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::BreakerOpenError;

    #[test]
    fn test_open_maps_to_503_with_retry_after() {
        let err: CallError<UpstreamError> = BreakerOpenError {
            dependency: "embeddings".into(),
            retry_after_ms: 1_500,
        }
        .into();
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_upstream_status_mapping() {
        let limited = ApiError::from(CallError::Operation(UpstreamError::Status {
            status: 429,
            body: String::new(),
        }));
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

        let down = ApiError::from(CallError::Operation(UpstreamError::Status {
            status: 500,
            body: String::new(),
        }));
        assert_eq!(down.status, StatusCode::BAD_GATEWAY);

        let slow = ApiError::from(CallError::Operation(UpstreamError::Timeout { timeout_ms: 10 }));
        assert_eq!(slow.status, StatusCode::GATEWAY_TIMEOUT);
        assert!(slow.retry_after_ms.is_none());
    }
}
