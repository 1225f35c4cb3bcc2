//! High-level API over taskvisor `Supervisor` used by grun-core.
//! - Owns a `Supervisor` instance.
//! - Turns every pool into one periodic task driving its [`ScalingEngine`].
//! - Submits pool tasks via the controller so passes of one pool never overlap.
mod task;
pub use task::{pool_task, reconcile_once};

use std::sync::Arc;

use grun_model::PoolSpec;
use taskvisor::{SupervisorConfig, ControllerConfig, Subscribe, Supervisor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    engine::ScalingEngine,
    error::CoreError,
    map::to_controller_spec,
    metrics::MetricsHandle,
    state::{StateSubscriber, StatusStore},
};

/// Thin wrapper around taskvisor [`Supervisor`] scheduling pool reconciliation.
///
/// This type is responsible for:
/// - constructing and running the supervisor;
/// - registering pools in the [`StatusStore`];
/// - mapping pool schedules into controller specs and submitting them.
pub struct PoolSupervisor {
    sup: Arc<Supervisor>,
    store: StatusStore,
    metrics: MetricsHandle,
    stopped: CancellationToken,
}

impl PoolSupervisor {
    /// Create a supervisor with explicit configs and start its run loop in background.
    ///
    /// `sup_cfg` — supervisor settings
    /// `ctrl_cfg` — controller settings
    /// `subscribers` — event subscribers; a [`StateSubscriber`] for `store` is always added
    /// `store` — status table shared with the API
    /// `metrics` — backend for pass metrics
    pub async fn new(
        sup_cfg: SupervisorConfig,
        ctrl_cfg: ControllerConfig,
        mut subscribers: Vec<Arc<dyn Subscribe>>,
        store: StatusStore,
        metrics: MetricsHandle,
    ) -> Result<Self, CoreError> {
        subscribers.push(Arc::new(StateSubscriber::new(store.clone())));

        let sup = Supervisor::builder(sup_cfg)
            .with_subscribers(subscribers)
            .with_controller(ctrl_cfg)
            .build();

        let stopped = CancellationToken::new();
        let runner = Arc::clone(&sup);
        let done = stopped.clone();
        tokio::spawn(async move {
            if let Err(e) = runner.run(Vec::new()).await {
                error!(error = %e, "supervisor run loop exited with error");
            }
            done.cancel();
        });
        sup.wait_ready().await;
        info!("supervisor is ready to accept pools");
        Ok(Self {
            sup,
            store,
            metrics,
            stopped,
        })
    }

    /// Get a clone of the underlying supervisor handle.
    pub fn supervisor(&self) -> Arc<Supervisor> {
        Arc::clone(&self.sup)
    }

    /// Status table updated by pool tasks.
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Resolves once the supervisor run loop has exited (e.g. after an OS shutdown signal).
    pub async fn stopped(&self) {
        self.stopped.cancelled().await
    }

    /// Validate `pool` and schedule its periodic reconciliation.
    ///
    /// Resubmitting a pool with the same name replaces the running task.
    #[instrument(level = "debug", skip_all, fields(pool = %pool.name))]
    pub async fn submit(&self, pool: PoolSpec, engine: Arc<ScalingEngine>) -> Result<(), CoreError> {
        pool.validate()?;
        self.store.register(&pool);

        let schedule = pool.schedule;
        let task = pool_task(Arc::new(pool), engine, self.store.clone(), self.metrics.clone());

        debug!(
            interval_ms = schedule.interval_ms,
            timeout_ms = schedule.timeout_ms,
            "submitting pool via controller"
        );
        self.sup
            .submit(to_controller_spec(task, &schedule))
            .await
            .map_err(|e| CoreError::Supervisor(e.to_string()))
    }
}
