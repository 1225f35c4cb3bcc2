use grun_model::PoolName;
use serde::{Deserialize, Serialize};

use crate::engine::ScalingDecision;

/// Externally visible state of one pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub name: PoolName,
    /// Resolved scope, e.g. `org/acme` or `repo/acme/app`.
    pub scope: String,
    pub active_runners: usize,
    pub max_active_runners: usize,
    /// RFC3339 time of the last finished pass.
    pub last_check_time: Option<String>,
    pub last_pass: Option<PassSummary>,
    pub last_error: Option<String>,
    /// Finished passes, successful or not.
    pub passes: u64,
}

/// Counters of the last successful pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub fetched: usize,
    pub candidates: usize,
    pub spawned: usize,
    pub skipped: usize,
    pub evicted: usize,
    pub outcome: String,
}

impl From<&ScalingDecision> for PassSummary {
    fn from(d: &ScalingDecision) -> Self {
        Self {
            fetched: d.fetched,
            candidates: d.candidates.len(),
            spawned: d.spawned.len(),
            skipped: d.skipped,
            evicted: d.evicted,
            outcome: d.outcome.as_label().to_string(),
        }
    }
}
