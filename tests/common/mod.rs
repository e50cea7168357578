//! Common test utilities

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Extension,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use smartess_backend::{
    api::route_table_with, build_router, CapabilityKind, Config, JsonBody, MountPoint,
};
use tower::util::ServiceExt;

/// Config used by tests: defaults, independent of the process environment.
pub fn test_config() -> Config {
    Config::default()
}

/// Dispatcher whose sub-routers echo what they received and count hits.
pub struct RecordingApp {
    pub app: Router,
    pub hits: Arc<AtomicUsize>,
}

impl RecordingApp {
    pub fn new(config: &Config) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let table = route_table_with(|kind| recording_router(kind, counter.clone()))
            .expect("route table must build");

        Self {
            app: build_router(table, config),
            hits,
        }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn recording_router(kind: CapabilityKind, hits: Arc<AtomicUsize>) -> Router {
    Router::new().fallback(
        move |method: Method,
              uri: Uri,
              mount: Option<Extension<MountPoint>>,
              body: Option<Extension<JsonBody>>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "capability": kind.slug(),
                    "method": method.to_string(),
                    "path": uri.path(),
                    "query": uri.query(),
                    "original_uri": mount.map(|Extension(m)| m.original_uri.to_string()),
                    "body": body.map(|Extension(JsonBody(v))| v),
                }))
            }
        },
    )
}

/// Send a request and decode the response body as JSON (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };

    (status, headers, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn preflight(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,authorization")
        .body(Body::empty())
        .unwrap()
}
