//! Read-only HTTP status API.
//!
//! Routes:
//! - `GET /api/v1/pools` - statuses of all pools, sorted by name
//! - `GET /api/v1/pools/{name}` - status of one pool, 404 if unknown
//! - `GET /healthz` - liveness probe

mod error;
mod handler;
mod http;

pub use error::ApiError;
pub use handler::{StatusHandler, StoreHandler};
pub use http::HttpApi;
