//! Request ID middleware for request tracing and correlation.
//!
//! An `x-request-id` from an upstream proxy is reused when it is a short token
//! of `[A-Za-z0-9._-]`; anything else is replaced by a fresh UUID v4 so
//! arbitrary header text never reaches logs or Sentry tags. The ID is recorded
//! in the current span, tagged on the Sentry scope and echoed back.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID that is propagated as-is.
pub const MAX_REQUEST_ID_LEN: usize = 128;

fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// The request ID to use for a request with these headers.
pub fn request_id_for(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_valid_request_id(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_for(request.headers());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    fn is_uuid(id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }

    #[test]
    fn test_upstream_id_is_reused() {
        assert_eq!(request_id_for(&headers_with("cf-8a1b.c2_d3")), "cf-8a1b.c2_d3");
    }

    #[test]
    fn test_missing_or_empty_id_is_generated() {
        assert!(is_uuid(&request_id_for(&HeaderMap::new())));
        assert!(is_uuid(&request_id_for(&headers_with(""))));
    }

    #[test]
    fn test_untrusted_id_is_replaced() {
        assert!(is_uuid(&request_id_for(&headers_with("owner=1 admin=true"))));
        assert!(is_uuid(&request_id_for(&headers_with(&"a".repeat(129)))));
        assert_eq!(
            request_id_for(&headers_with(&"a".repeat(128))),
            "a".repeat(128)
        );
    }
}
