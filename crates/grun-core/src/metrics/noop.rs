use crate::metrics::backend::{MetricsBackend, PassOutcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_pass(&self, _: &str, _: PassOutcome, _: u64) {}

    #[inline(always)]
    fn record_spawned(&self, _: &str, _: u64) {}

    #[inline(always)]
    fn record_queue_error(&self, _: &str, _: &str) {}

    #[inline(always)]
    fn set_active(&self, _: &str, _: u64) {}

    #[inline(always)]
    fn set_pending(&self, _: &str, _: u64) {}
}
