mod constants;
pub use constants::{
    DEFAULT_INTERVAL_MS, DEFAULT_RUNNER_LABELS, DEFAULT_TIMEOUT_MS, LABEL_SCHEMA_DELIMITER,
};

mod secret;
pub use secret::SecretRef;

/// Unique name of a runner pool.
///
/// Used as the supervisor slot, as the metrics label and as the prefix of launched workloads.
pub type PoolName = String;

/// Identifier of a job inside the queue service.
///
/// Only unique within a single scope of visibility of one queue-service instance.
pub type JobId = i64;

/// Timeout value in milliseconds.
pub type TimeoutMs = u64;
