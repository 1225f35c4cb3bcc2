//! Launcher abstraction used by the scaling engine to create workloads.
//!
//! Concrete launchers (e.g. `grun-exec`) implement this trait; the engine treats them as a black box.
mod error;
pub use error::LaunchError;

mod id;
pub use id::make_workload_name;

mod request;
pub use request::LaunchRequest;

use async_trait::async_trait;

/// Creates ephemeral runner workloads and reports how many are alive.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launcher name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Number of workloads of `pool` that are currently alive.
    async fn active_count(&self, pool: &str) -> Result<usize, LaunchError>;

    /// Request creation of one workload.
    ///
    /// Returns the workload name once the launch was accepted.
    /// A returned workload stays counted by [`Launcher::active_count`] until it terminates.
    async fn launch(&self, request: &LaunchRequest) -> Result<String, LaunchError>;
}
