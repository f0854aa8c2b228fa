//! Response construction helpers.

use http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use http::{Response, StatusCode};
use serde::Serialize;

pub type Body = Vec<u8>;

const JSON: &str = "application/json";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// JSON response with the given status.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => with_status(status, bytes, Some(JSON)),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// JSON response that browsers and CDNs must not cache.
pub fn json_uncached<T: Serialize>(value: &T) -> Response<Body> {
    let mut resp = json(StatusCode::OK, value);
    resp.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    resp
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: &str) -> Response<Body> {
    let body = serde_json::json!({ "error": message }).to_string().into_bytes();
    with_status(status, body, Some(JSON))
}

pub fn no_content() -> Response<Body> {
    with_status(StatusCode::NO_CONTENT, Vec::new(), None)
}

fn with_status(status: StatusCode, body: Body, content_type: Option<&'static str>) -> Response<Body> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    if let Some(ct) = content_type {
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(ct));
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncached_headers() {
        let resp = json_uncached(&serde_json::json!([]));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CACHE_CONTROL], NO_CACHE);
        assert_eq!(resp.headers()[CONTENT_TYPE], JSON);
        assert_eq!(resp.body(), b"[]");
    }

    #[test]
    fn test_error_body() {
        let resp = error(StatusCode::BAD_REQUEST, "variantId is required");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body(), br#"{"error":"variantId is required"}"#);
    }

    #[test]
    fn test_no_content_is_empty() {
        let resp = no_content();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.body().is_empty());
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }
}
