//! API module
//!
//! Router assembly: middleware stack, health check and prefix dispatch.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppResult;
use crate::routing::{dispatch, Dispatcher};

pub use middleware::JsonBody;
pub use routes::{default_route_table, route_table_with, CapabilityKind};

/// Build the dispatcher with every route group mounted.
///
/// Fails if the configuration is invalid or the route table cannot be
/// built; nothing is served from a partially built table.
pub fn initialize(config: &Config) -> AppResult<Router> {
    tracing::info!("Server is initializing...");
    config.validate()?;

    let table = default_route_table()?;
    tracing::info!(route_groups = table.len(), "Route groups mounted");

    Ok(build_router(table, config))
}

/// Wrap a route table in the standard middleware stack.
///
/// Axum layers run in reverse order of registration, so requests pass
/// CORS -> request id -> trace -> logging -> JSON body -> dispatch.
pub fn build_router(table: Dispatcher, config: &Config) -> Router {
    let json_settings = middleware::JsonBodySettings {
        limit: config.json_body_limit,
    };

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .fallback(dispatch)
        .with_state(Arc::new(table))
        .layer(axum_middleware::from_fn_with_state(
            json_settings,
            middleware::json_body_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::cors_layer(config))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
