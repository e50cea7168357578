//! API Middleware
//!
//! Cross-origin policy, JSON body parsing and request logging.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::error::AppError;

// =========================================================================
// Cross-origin policy
// =========================================================================

/// Methods announced in preflight responses
const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Build the CORS layer.
///
/// With `*` among the configured origins any origin is accepted; otherwise
/// only the listed origins are. Requested headers are mirrored back in
/// preflight responses.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(CORS_METHODS)
        .allow_headers(AllowHeaders::mirror_request())
}

// =========================================================================
// JSON body parsing
// =========================================================================

/// Parsed JSON request body, stored in request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Settings for [`json_body_middleware`]
#[derive(Debug, Clone, Copy)]
pub struct JsonBodySettings {
    /// Maximum body size in bytes
    pub limit: usize,
}

/// True for `application/json`, with or without parameters.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json"
}

/// Read the whole body, failing with 413 only when `limit` is exceeded.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, AppError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(AppError::PayloadTooLarge { limit })
        }
        Err(e) => Err(AppError::InvalidRequest(format!(
            "Failed to read request body: {}",
            e
        ))),
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Parse JSON bodies before dispatch.
///
/// Malformed bodies never reach a sub-router. Only objects and arrays are
/// accepted at the top level; an empty body passes through without a
/// [`JsonBody`] extension.
pub async fn json_body_middleware(
    State(settings): State<JsonBodySettings>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !is_json_content_type(request.headers()) {
        return Ok(next.run(request).await);
    }

    if declared_length(request.headers()).is_some_and(|len| len > settings.limit) {
        return Err(AppError::PayloadTooLarge {
            limit: settings.limit,
        });
    }

    let (mut parts, body) = request.into_parts();
    let bytes = read_body(body, settings.limit).await?;

    if !bytes.is_empty() {
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| AppError::MalformedJson(e.to_string()))?;

        if !(value.is_object() || value.is_array()) {
            return Err(AppError::InvalidRequest(
                "JSON body must be an object or an array".to_string(),
            ));
        }

        parts.extensions.insert(JsonBody(value));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

// =========================================================================
// Header masking
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request logging
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let start = std::time::Instant::now();

    tracing::debug!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::debug!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use futures_util::stream;
    use std::io;
    use tower::ServiceExt;

    fn headers_with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type(&headers_with_content_type("application/json")));
        assert!(is_json_content_type(&headers_with_content_type(
            "application/json; charset=utf-8"
        )));
        assert!(is_json_content_type(&headers_with_content_type("Application/JSON")));
    }

    #[test]
    fn test_non_json_content_types() {
        assert!(!is_json_content_type(&HeaderMap::new()));
        assert!(!is_json_content_type(&headers_with_content_type("text/plain")));
        assert!(!is_json_content_type(&headers_with_content_type(
            "application/x-www-form-urlencoded"
        )));
        assert!(!is_json_content_type(&headers_with_content_type("text/json+xml")));
        assert!(!is_json_content_type(&headers_with_content_type(
            "application/merge-patch+json"
        )));
    }

    fn json_app(limit: usize) -> Router {
        Router::new()
            .route("/", post(|| async { "reached" }))
            .layer(axum::middleware::from_fn_with_state(
                JsonBodySettings { limit },
                json_body_middleware,
            ))
    }

    fn streamed_json(chunks: Vec<Result<Bytes, io::Error>>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from_stream(stream::iter(chunks)))
            .unwrap()
    }

    async fn error_code(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_broken_body_stream_is_invalid_request() {
        let request = streamed_json(vec![
            Ok(Bytes::from_static(b"{\"user\":")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ]);

        let response = json_app(1024).oneshot(request).await.unwrap();
        let (status, json) = error_code(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit_is_payload_too_large() {
        let request = streamed_json(vec![
            Ok(Bytes::from_static(b"{\"user\":\"")),
            Ok(Bytes::from(vec![b'a'; 64])),
            Ok(Bytes::from_static(b"\"}")),
        ]);

        let response = json_app(32).oneshot(request).await.unwrap();
        let (status, json) = error_code(response).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error_code"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_streamed_body_within_limit_reaches_handler() {
        let request = streamed_json(vec![
            Ok(Bytes::from_static(b"{\"user\":")),
            Ok(Bytes::from_static(b"\"a\"}")),
        ]);

        let response = json_app(1024).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_declared_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(declared_length(&headers), Some(42));
    }

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer abc.def".parse().unwrap());
        headers.insert("x-request-id", "req-123".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let request_id = masked.iter().find(|(k, _)| k == "x-request-id");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(request_id.unwrap().1, "req-123");
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(SENSITIVE_HEADERS.contains(&"cookie"));
        assert!(!SENSITIVE_HEADERS.contains(&"content-type"));
    }
}
