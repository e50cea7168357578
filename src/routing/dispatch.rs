//! Request dispatch
//!
//! Forwards a request to the sub-router owning its path prefix, with the
//! prefix stripped from the URI.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{uri::PathAndQuery, Request, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceExt;

use super::table::RouteTable;
use crate::error::AppError;

/// Table type served by the dispatcher.
pub type Dispatcher = RouteTable<Router>;

/// Where the current request was mounted, available to sub-routers as a
/// request extension.
#[derive(Debug, Clone)]
pub struct MountPoint {
    pub prefix: String,
    pub original_uri: Uri,
}

/// Fallback handler of the outer router.
pub async fn dispatch(
    State(table): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let path = parts.uri.path().to_owned();

    let Some(matched) = table.lookup(&path) else {
        tracing::debug!(method = %parts.method, path = %path, "No route matched");
        return AppError::RouteNotFound {
            method: parts.method.to_string(),
            path: path.clone(),
        }
        .into_response();
    };

    let forwarded = match strip_uri(&parts.uri, matched.remainder) {
        Ok(uri) => uri,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(
        prefix = %matched.prefix,
        remainder = %matched.remainder,
        "Dispatching request"
    );

    parts.extensions.insert(MountPoint {
        prefix: matched.prefix.to_string(),
        original_uri: std::mem::replace(&mut parts.uri, forwarded),
    });

    let router = matched.handler.clone();
    match router.oneshot(Request::from_parts(parts, body)).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Rebuild `uri` with `remainder` as its path, keeping the query string.
fn strip_uri(uri: &Uri, remainder: &str) -> Result<Uri, AppError> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{remainder}?{query}"),
        None => remainder.to_string(),
    };

    let path_and_query: PathAndQuery = path_and_query
        .parse()
        .map_err(|e| AppError::Internal(format!("Failed to rewrite request path: {e}")))?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts)
        .map_err(|e| AppError::Internal(format!("Failed to rewrite request uri: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_uri_keeps_query() {
        let uri: Uri = "/api/units/7?from=2024-01-01".parse().unwrap();
        let stripped = strip_uri(&uri, "/7").unwrap();
        assert_eq!(stripped.path(), "/7");
        assert_eq!(stripped.query(), Some("from=2024-01-01"));
    }

    #[test]
    fn test_strip_uri_absolute_form() {
        let uri: Uri = "http://localhost:3000/api/hubs".parse().unwrap();
        let stripped = strip_uri(&uri, "/").unwrap();
        assert_eq!(stripped.path(), "/");
        assert_eq!(stripped.host(), Some("localhost"));
    }
}
