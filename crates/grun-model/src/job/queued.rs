use serde::{Deserialize, Serialize};

use crate::{domain::JobId, job::JobStatus};

/// One job waiting for a matching runner.
///
/// Mirrors the job object of the queue service; the scaling engine never mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub name: String,
    /// Labels from the job's `runs-on`; semantically a set.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub run_id: i64,
    #[serde(default)]
    pub runner_id: i64,
    #[serde(default)]
    pub runner_name: String,
}

impl QueuedJob {
    /// Minimal job, mostly useful for tests and fakes.
    pub fn new<I, L>(id: JobId, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            id,
            status: JobStatus::Queued,
            name: String::new(),
            labels: labels.into_iter().map(Into::into).collect(),
            run_id: 0,
            runner_id: 0,
            runner_name: String::new(),
        }
    }
}
