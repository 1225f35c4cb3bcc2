use std::sync::Arc;

/// Reconciliation pass outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Pool was full; no fetch was performed.
    AtCapacity,
    /// Fetch succeeded but nothing had to be launched.
    Idle,
    /// At least one workload was launched.
    Scaled,
    /// Pass ended with an error.
    Failed,
    /// Pass was canceled.
    Canceled,
}

impl PassOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            PassOutcome::AtCapacity => "at_capacity",
            PassOutcome::Idle => "idle",
            PassOutcome::Scaled => "scaled",
            PassOutcome::Failed => "failed",
            PassOutcome::Canceled => "canceled",
        }
    }
}

/// Backend metrics collection interface.
///
/// This trait abstracts metrics collection across different backends.
/// Implementations are injected into the scaling engine and the pool tasks.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a finished reconciliation pass.
    ///
    /// # Arguments
    /// - `pool`: Pool name
    /// - `outcome`: How the pass ended
    /// - `duration_ms`: Pass duration in milliseconds
    fn record_pass(&self, pool: &str, outcome: PassOutcome, duration_ms: u64);
    /// Record launched workloads.
    fn record_spawned(&self, pool: &str, count: u64);
    /// Record a failed queue-service call.
    ///
    /// `kind` is [`crate::QueueError::kind`].
    fn record_queue_error(&self, pool: &str, kind: &str);
    /// Set the number of live workloads observed at the start of a pass.
    fn set_active(&self, pool: &str, count: u64);
    /// Set the number of matching pending jobs seen by the last fetch.
    fn set_pending(&self, pool: &str, count: u64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
