mod domain;
pub use domain::{DEFAULT_INTERVAL_MS, DEFAULT_RUNNER_LABELS, DEFAULT_TIMEOUT_MS, LABEL_SCHEMA_DELIMITER};
pub use domain::{JobId, PoolName, SecretRef, TimeoutMs};

mod error;
pub use error::{ModelError, ModelResult};

mod job;
pub use job::{JobStatus, PendingStatus, QueuedJob};

mod spec;
pub use spec::{PoolSchedule, PoolScope, PoolSpec, ScopeTarget};
