//! Prometheus metrics backend for the grun autoscaler.
//!
//! [`PrometheusMetrics`] implements [`grun_core::MetricsBackend`]; hand it to the scaling
//! engines and pool tasks as a [`grun_core::MetricsHandle`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use grun_core::{MetricsBackend, MetricsHandle, PassOutcome};
//! use grun_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//!
//! handle.record_pass("linux", PassOutcome::Scaled, 120);
//! let body = metrics.encode_text()?;
//! assert!(body.contains("grun_passes_total"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `grun_passes_total{pool, outcome}` - Counter
//! - `grun_pass_duration_seconds{pool}` - Histogram
//! - `grun_runners_spawned_total{pool}` - Counter
//! - `grun_queue_errors_total{pool, kind}` - Counter
//! - `grun_active_runners{pool}` - Gauge
//! - `grun_pending_jobs{pool}` - Gauge
//!
//! This crate does not serve HTTP; the daemon exposes [`PrometheusMetrics::encode_text`] on `/metrics`.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TEXT_FORMAT, TextEncoder};
