//! Contract of the queue-service client used by the scaling engine.
//!
//! Concrete clients (e.g. `grun-gitea`) implement [`JobSource`]; the engine only sees this trait.
mod error;
pub use error::QueueError;

use std::fmt;

use async_trait::async_trait;
use grun_model::{QueuedJob, ScopeTarget};

use crate::capability::Capabilities;

/// Everything a client needs to collect the pending jobs of one pool.
#[derive(Clone)]
pub struct QueueQuery {
    /// Base URL of the queue-service instance.
    pub base_url: String,
    /// API token used for the bearer-style authorization header.
    pub token: String,
    /// Resolved scope of the pool.
    pub target: ScopeTarget,
    /// Effective capabilities; only jobs they satisfy are returned.
    pub capabilities: Capabilities,
}

impl fmt::Debug for QueueQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueQuery")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("target", &self.target)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Source of pending jobs.
///
/// The result is all-or-nothing: either every matching pending job visible in the scope, or an error.
/// Implementations must not return partial results.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Source name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Collect all pending jobs of `query.target` whose requirements `query.capabilities` satisfy.
    ///
    /// Jobs are returned in fetch order; duplicates across pending categories are possible.
    async fn fetch_queued(&self, query: &QueueQuery) -> Result<Vec<QueuedJob>, QueueError>;
}
