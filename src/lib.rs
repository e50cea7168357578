//! SmartEss backend library
//!
//! Builds the HTTP dispatcher that fronts the SmartEss route groups.
//! Re-exports modules for integration testing and embedding.

pub mod api;
pub mod config;
mod error;
pub mod routing;

pub use api::{build_router, initialize, CapabilityKind, JsonBody};
pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use routing::{MountPoint, RouteTable, RouteTableError};
