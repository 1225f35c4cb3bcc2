use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    domain::{DEFAULT_INTERVAL_MS, DEFAULT_TIMEOUT_MS, TimeoutMs},
    error::{ModelError, ModelResult},
};

/// How often a pool is reconciled and how long one pass may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSchedule {
    /// Delay between the end of one pass and the start of the next one.
    ///
    /// Also used as the retry delay after a failed pass.
    pub interval_ms: u64,
    /// Hard limit for a single pass; exceeded passes are canceled.
    pub timeout_ms: TimeoutMs,
}

impl PoolSchedule {
    pub fn validate(&self) -> ModelResult<()> {
        if self.interval_ms == 0 {
            return Err(ModelError::Invalid("schedule.intervalMs must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ModelError::Invalid("schedule.timeoutMs must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for PoolSchedule {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
