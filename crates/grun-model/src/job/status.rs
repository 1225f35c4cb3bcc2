use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job as reported by the queue service.
///
/// Unknown values deserialize into [`JobStatus::Unknown`] so new server-side states never break polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Waiting,
    Pending,
    Blocked,
    Running,
    Success,
    Failure,
    Cancelled,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Returns `true` while the job still waits for a runner.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Waiting | JobStatus::Pending)
    }
}

/// Pending-state category used as the `status` query filter.
///
/// Every category is fetched separately and the results are concatenated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PendingStatus {
    Queued,
    Waiting,
    Pending,
}

impl PendingStatus {
    /// All categories in fetch order.
    pub const ALL: [PendingStatus; 3] = [
        PendingStatus::Queued,
        PendingStatus::Waiting,
        PendingStatus::Pending,
    ];

    /// Query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Queued => "queued",
            PendingStatus::Waiting => "waiting",
            PendingStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
