use std::fmt;

use grun_model::{JobId, PoolName};

/// Parameters for creating one ephemeral runner workload.
#[derive(Clone)]
pub struct LaunchRequest {
    /// Pool the workload belongs to.
    pub pool: PoolName,
    /// Queue-service base URL the runner registers with.
    pub gitea_url: String,
    /// Effective capabilities, comma-joined.
    pub labels: String,
    /// Registration credential handed to the runner.
    pub registration_token: String,
    /// Job that triggered the launch.
    pub job_id: JobId,
}

impl fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("pool", &self.pool)
            .field("gitea_url", &self.gitea_url)
            .field("labels", &self.labels)
            .field("registration_token", &"<redacted>")
            .field("job_id", &self.job_id)
            .finish()
    }
}
