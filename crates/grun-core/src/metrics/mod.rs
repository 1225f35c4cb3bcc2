//! Metrics collection abstraction for the autoscaler.
//!
//! Backends (prometheus, etc) implement [`MetricsBackend`] and are injected into the engine.
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, PassOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
