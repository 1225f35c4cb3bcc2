use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use grun_core::state::PoolStatus;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{error::ApiError, handler::StatusHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: StatusHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build the axum router with all status endpoints mounted.
    ///
    /// The router carries no state of its own, so callers can merge extra routes (e.g. `/metrics`).
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/pools", get(list_pools::<H>))
            .route("/api/v1/pools/{name}", get(get_pool::<H>))
            .route("/healthz", get(healthz))
            .with_state(self.handler)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ListPoolsResponse {
    pools: Vec<PoolStatus>,
}

/// GET /api/v1/pools
async fn list_pools<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: StatusHandler,
{
    let pools = handler.list_pools().await?;
    trace!(pools = pools.len(), "list pools");
    Ok(Json(ListPoolsResponse { pools }))
}

/// GET /api/v1/pools/{name}
async fn get_pool<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: StatusHandler,
{
    if name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("pool name cannot be empty".into()));
    }
    match handler.get_pool(&name).await? {
        Some(status) => Ok(Json(status)),
        None => Err(ApiError::NotFound(name)),
    }
}

async fn healthz() -> &'static str {
    "ok"
}
