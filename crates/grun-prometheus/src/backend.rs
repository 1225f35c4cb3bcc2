use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use grun_core::{MetricsBackend, PassOutcome};

const NAMESPACE: &str = "grun";

/// Prometheus metrics backend.
///
/// ## Label cardinality
/// - `pool`: one value per configured pool
/// - `outcome`: "at_capacity", "idle", "scaled", "failed", "canceled"
/// - `kind`: [`grun_core::QueueError::kind`] values
#[derive(Clone)]
pub struct PrometheusMetrics {
    passes: CounterVec,
    pass_duration: HistogramVec,
    spawned: CounterVec,
    queue_errors: CounterVec,
    active: IntGaugeVec,
    pending: IntGaugeVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create the backend and register its collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let passes = CounterVec::new(
            Opts::new("passes_total", "Reconciliation passes by outcome").namespace(NAMESPACE),
            &["pool", "outcome"],
        )?;
        registry.register(Box::new(passes.clone()))?;

        let pass_duration = HistogramVec::new(
            HistogramOpts::new("pass_duration_seconds", "Reconciliation pass duration in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["pool"],
        )?;
        registry.register(Box::new(pass_duration.clone()))?;

        let spawned = CounterVec::new(
            Opts::new("runners_spawned_total", "Runner workloads launched").namespace(NAMESPACE),
            &["pool"],
        )?;
        registry.register(Box::new(spawned.clone()))?;

        let queue_errors = CounterVec::new(
            Opts::new("queue_errors_total", "Failed queue-service calls by category")
                .namespace(NAMESPACE),
            &["pool", "kind"],
        )?;
        registry.register(Box::new(queue_errors.clone()))?;

        let active = IntGaugeVec::new(
            Opts::new("active_runners", "Live runner workloads at the start of the last pass")
                .namespace(NAMESPACE),
            &["pool"],
        )?;
        registry.register(Box::new(active.clone()))?;

        let pending = IntGaugeVec::new(
            Opts::new("pending_jobs", "Matching queued jobs seen by the last fetch")
                .namespace(NAMESPACE),
            &["pool"],
        )?;
        registry.register(Box::new(pending.clone()))?;

        Ok(Self {
            passes,
            pass_duration,
            spawned,
            queue_errors,
            active,
            pending,
            registry,
        })
    }

    /// Create the backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metric families for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl MetricsBackend for PrometheusMetrics {
    fn record_pass(&self, pool: &str, outcome: PassOutcome, duration_ms: u64) {
        self.passes
            .with_label_values(&[pool, outcome.as_label()])
            .inc();
        self.pass_duration
            .with_label_values(&[pool])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_spawned(&self, pool: &str, count: u64) {
        if count > 0 {
            self.spawned.with_label_values(&[pool]).inc_by(count as f64);
        }
    }

    fn record_queue_error(&self, pool: &str, kind: &str) {
        self.queue_errors.with_label_values(&[pool, kind]).inc();
    }

    fn set_active(&self, pool: &str, count: u64) {
        self.active.with_label_values(&[pool]).set(clamp(count));
    }

    fn set_pending(&self, pool: &str, count: u64) {
        self.pending.with_label_values(&[pool]).set(clamp(count));
    }
}
