use grun_model::{JobId, ModelError};
use thiserror::Error;

use crate::{launcher::LaunchError, queue::QueueError};

/// Reasons a reconciliation pass ended early.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("invalid pool: {0}")]
    InvalidPool(#[from] ModelError),

    #[error("queue fetch failed: {0}")]
    Queue(#[from] QueueError),

    /// Workloads launched before the failure stay alive.
    #[error("launch for job {job_id} failed after {spawned} spawned: {source}")]
    Launch {
        job_id: JobId,
        spawned: usize,
        source: LaunchError,
    },

    #[error("pass canceled")]
    Canceled,
}

