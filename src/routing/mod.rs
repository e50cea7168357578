//! Prefix routing
//!
//! # Data Flow
//! ```text
//! Startup:
//!     (prefix, sub-router) pairs
//!     → table.rs (validate, reject duplicates)
//!     → freeze as immutable RouteTable behind an Arc
//!
//! Per request:
//!     dispatch.rs → RouteTable::lookup(path)
//!     → strip prefix, forward to sub-router
//!     → or report route_not_found
//! ```

pub mod dispatch;
pub mod table;

pub use dispatch::{dispatch, Dispatcher, MountPoint};
pub use table::{Prefix, RouteMatch, RouteTable, RouteTableBuilder, RouteTableError};
