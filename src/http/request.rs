//! Request identification.
//!
//! IDs are assigned by tower-http's `SetRequestIdLayer` (UUID v4) when the
//! client did not send one, and echoed back on the response.

use axum::http::HeaderMap;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request's ID for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }
}
