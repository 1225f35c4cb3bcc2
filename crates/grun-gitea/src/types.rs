//! Gitea API v1 response types.
//!
//! Only the fields the autoscaler reads are modeled.

use grun_model::QueuedJob;
use serde::Deserialize;

/// Page of `/actions/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsResponse {
    #[serde(default)]
    pub total_count: i64,
    /// Gitea sends `null` instead of `[]` for empty pages.
    #[serde(default)]
    pub jobs: Option<Vec<QueuedJob>>,
}

impl JobsResponse {
    /// Reported number of matching jobs; `0` with a non-empty page means the field was absent.
    pub fn total(&self) -> Option<usize> {
        match self.jobs.as_deref() {
            Some(jobs) if !jobs.is_empty() && self.total_count <= 0 => None,
            _ => usize::try_from(self.total_count).ok(),
        }
    }

    pub fn into_jobs(self) -> Vec<QueuedJob> {
        self.jobs.unwrap_or_default()
    }
}

/// Repository owner reference (subset of fields).
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Entry of `/users/{user}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub owner: RepositoryOwner,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
}
