use async_trait::async_trait;
use grun_core::state::{PoolStatus, StatusStore};

use crate::error::ApiError;

/// Source of pool statuses served by [`crate::HttpApi`].
///
/// [`StoreHandler`] reads the in-memory [`StatusStore`]; other implementations can add
/// filtering or access control.
#[async_trait]
pub trait StatusHandler: Send + Sync + 'static {
    /// All pools, sorted by name.
    async fn list_pools(&self) -> Result<Vec<PoolStatus>, ApiError>;

    /// One pool by name, `None` if it is not configured.
    async fn get_pool(&self, name: &str) -> Result<Option<PoolStatus>, ApiError>;
}

/// Handler backed by the status store the pool tasks write to.
#[derive(Clone, Debug)]
pub struct StoreHandler {
    store: StatusStore,
}

impl StoreHandler {
    pub fn new(store: StatusStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatusHandler for StoreHandler {
    async fn list_pools(&self) -> Result<Vec<PoolStatus>, ApiError> {
        Ok(self.store.list())
    }

    async fn get_pool(&self, name: &str) -> Result<Option<PoolStatus>, ApiError> {
        Ok(self.store.get(name))
    }
}
