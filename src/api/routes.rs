//! API Routes
//!
//! The route groups served under `/api` and their default sub-routers.

use axum::{
    extract::Extension,
    http::{Method, StatusCode, Uri},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::routing::{Dispatcher, MountPoint, RouteTable, RouteTableError};

use super::middleware::JsonBody;

// =========================================================================
// Capabilities
// =========================================================================

/// A route group mounted under its own path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    Auth,
    StartProject,
    Projects,
    Hubs,
    Widgets,
    ManageAccounts,
    Units,
    IndividualUnit,
    Tickets,
    Announcements,
    Consumptions,
    Surveillance,
    Registration,
    ResetPassword,
    Alerts,
}

impl CapabilityKind {
    /// All route groups, in mount order.
    pub const ALL: [CapabilityKind; 15] = [
        CapabilityKind::Auth,
        CapabilityKind::StartProject,
        CapabilityKind::Projects,
        CapabilityKind::Hubs,
        CapabilityKind::Widgets,
        CapabilityKind::ManageAccounts,
        CapabilityKind::Units,
        CapabilityKind::IndividualUnit,
        CapabilityKind::Tickets,
        CapabilityKind::Announcements,
        CapabilityKind::Consumptions,
        CapabilityKind::Surveillance,
        CapabilityKind::Registration,
        CapabilityKind::ResetPassword,
        CapabilityKind::Alerts,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            CapabilityKind::Auth => "auth",
            CapabilityKind::StartProject => "start-project",
            CapabilityKind::Projects => "projects",
            CapabilityKind::Hubs => "hubs",
            CapabilityKind::Widgets => "widgets",
            CapabilityKind::ManageAccounts => "manage-accounts",
            CapabilityKind::Units => "units",
            CapabilityKind::IndividualUnit => "individual-unit",
            CapabilityKind::Tickets => "tickets",
            CapabilityKind::Announcements => "announcements",
            CapabilityKind::Consumptions => "consumptions",
            CapabilityKind::Surveillance => "surveillance",
            CapabilityKind::Registration => "registration",
            CapabilityKind::ResetPassword => "reset-password",
            CapabilityKind::Alerts => "alerts",
        }
    }

    /// Path prefix the group is mounted under.
    pub fn prefix(self) -> String {
        format!("/api/{}", self.slug())
    }

    pub fn description(self) -> &'static str {
        match self {
            CapabilityKind::Auth => "authentication",
            CapabilityKind::StartProject => "project initiation",
            CapabilityKind::Projects => "project management",
            CapabilityKind::Hubs => "hub management",
            CapabilityKind::Widgets => "widget management",
            CapabilityKind::ManageAccounts => "account administration",
            CapabilityKind::Units => "unit management",
            CapabilityKind::IndividualUnit => "single-unit operations",
            CapabilityKind::Tickets => "support ticketing",
            CapabilityKind::Announcements => "announcements",
            CapabilityKind::Consumptions => "consumption metering",
            CapabilityKind::Surveillance => "surveillance data",
            CapabilityKind::Registration => "registration",
            CapabilityKind::ResetPassword => "password reset",
            CapabilityKind::Alerts => "alerting",
        }
    }

    /// Placeholder sub-router used until the group's handlers are mounted.
    ///
    /// Every request is acknowledged with `501 Not Implemented` and a
    /// [`CapabilityReceipt`] describing what was forwarded.
    pub fn default_router(self) -> Router {
        Router::new()
            .fallback(capability_placeholder)
            .layer(Extension(self))
    }
}

// =========================================================================
// Route table
// =========================================================================

/// Build the route table, asking `router_for` for each group's sub-router.
pub fn route_table_with<F>(mut router_for: F) -> Result<Dispatcher, RouteTableError>
where
    F: FnMut(CapabilityKind) -> Router,
{
    CapabilityKind::ALL
        .into_iter()
        .fold(RouteTable::builder(), |builder, kind| {
            builder.mount(kind.prefix(), router_for(kind))
        })
        .build()
}

/// Route table with every group on its placeholder sub-router.
pub fn default_route_table() -> Result<Dispatcher, RouteTableError> {
    route_table_with(CapabilityKind::default_router)
}

// =========================================================================
// Placeholder handler
// =========================================================================

/// What a placeholder sub-router received.
#[derive(Debug, Serialize)]
pub struct CapabilityReceipt {
    pub error: String,
    pub error_code: String,
    pub capability: CapabilityKind,
    pub prefix: Option<String>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

async fn capability_placeholder(
    Extension(kind): Extension<CapabilityKind>,
    mount: Option<Extension<MountPoint>>,
    body: Option<Extension<JsonBody>>,
    method: Method,
    uri: Uri,
) -> (StatusCode, Json<CapabilityReceipt>) {
    let error = AppError::CapabilityNotImplemented {
        capability: kind.description().to_string(),
    };
    let (status, error_code) = error.status_and_code();

    tracing::debug!(
        capability = kind.slug(),
        path = uri.path(),
        "No handler mounted for capability"
    );

    (
        status,
        Json(CapabilityReceipt {
            error: error.to_string(),
            error_code: error_code.to_string(),
            capability: kind,
            prefix: mount.map(|Extension(m)| m.prefix),
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            body: body.map(|Extension(JsonBody(value))| value),
        }),
    )
}
