use std::{sync::Arc, time::Instant};

use grun_model::PoolSpec;
use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    engine::{ScalingDecision, ScalingEngine},
    error::CoreError,
    metrics::{MetricsHandle, PassOutcome},
    secret::resolve_credentials,
    state::StatusStore,
};

/// Build the periodic task of one pool; the task name is the pool name.
pub fn pool_task(
    pool: Arc<PoolSpec>,
    engine: Arc<ScalingEngine>,
    store: StatusStore,
    metrics: MetricsHandle,
) -> TaskRef {
    TaskFn::arc(pool.name.clone(), move |ctx: CancellationToken| {
        let pool = pool.clone();
        let engine = engine.clone();
        let store = store.clone();
        let metrics = metrics.clone();

        async move { reconcile_once(&pool, &engine, &store, &metrics, &ctx).await }
    })
}

/// One scheduled pass: resolve secrets, count live workloads, run the engine, publish the result.
///
/// Failures are recorded and returned as [`TaskError::Fail`] so the supervisor retries after the interval.
pub async fn reconcile_once(
    pool: &PoolSpec,
    engine: &ScalingEngine,
    store: &StatusStore,
    metrics: &MetricsHandle,
    ctx: &CancellationToken,
) -> Result<(), TaskError> {
    if ctx.is_cancelled() {
        return Err(TaskError::Canceled);
    }
    let started = Instant::now();
    let mut live = None;
    let res = pass(pool, engine, ctx, &mut live).await;
    let elapsed = started.elapsed().as_millis() as u64;

    match res {
        Ok(decision) => {
            metrics.record_pass(&pool.name, decision.outcome, elapsed);
            store.record_decision(&pool.name, &decision);
            debug!(pool = %pool.name, outcome = decision.outcome.as_label(), elapsed_ms = elapsed, "pass done");
            Ok(())
        }
        Err(e) if e.is_canceled() => {
            metrics.record_pass(&pool.name, PassOutcome::Canceled, elapsed);
            Err(TaskError::Canceled)
        }
        Err(e) => {
            metrics.record_pass(&pool.name, PassOutcome::Failed, elapsed);
            store.record_failure(&pool.name, live, e.to_string());
            warn!(pool = %pool.name, error = %e, "pass failed");
            Err(TaskError::Fail {
                reason: e.to_string(),
            })
        }
    }
}

async fn pass(
    pool: &PoolSpec,
    engine: &ScalingEngine,
    ctx: &CancellationToken,
    live: &mut Option<usize>,
) -> Result<ScalingDecision, CoreError> {
    let creds = resolve_credentials(&pool.auth_token, &pool.registration_token).await?;
    let active = engine.launcher().active_count(&pool.name).await?;
    *live = Some(active);

    Ok(engine.run_pass(pool, &creds, active, ctx).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use grun_model::{PoolScope, QueuedJob, SecretRef};

    use crate::{
        cache::SpawnCache,
        launcher::{LaunchError, LaunchRequest, Launcher},
        metrics::{MetricsBackend, noop_metrics},
        queue::{JobSource, QueueError, QueueQuery},
    };

    struct StaticSource(Result<Vec<i64>, u16>);

    #[async_trait]
    impl JobSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_queued(&self, _: &QueueQuery) -> Result<Vec<QueuedJob>, QueueError> {
            match &self.0 {
                Ok(ids) => Ok(ids.iter().map(|id| QueuedJob::new(*id, Vec::<String>::new())).collect()),
                Err(status) => Err(QueueError::from_status(*status, "", "fetch queued jobs")),
            }
        }
    }

    struct CountingLauncher {
        live: usize,
        launched: Mutex<usize>,
    }

    #[async_trait]
    impl Launcher for CountingLauncher {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn active_count(&self, _: &str) -> Result<usize, LaunchError> {
            Ok(self.live)
        }

        async fn launch(&self, r: &LaunchRequest) -> Result<String, LaunchError> {
            *self.launched.lock().unwrap() += 1;
            Ok(format!("w-{}", r.job_id))
        }
    }

    #[derive(Default)]
    struct RecordingMetrics(Mutex<Vec<PassOutcome>>);

    impl MetricsBackend for RecordingMetrics {
        fn record_pass(&self, _: &str, outcome: PassOutcome, _: u64) {
            self.0.lock().unwrap().push(outcome);
        }
        fn record_spawned(&self, _: &str, _: u64) {}
        fn record_queue_error(&self, _: &str, _: &str) {}
        fn set_active(&self, _: &str, _: u64) {}
        fn set_pending(&self, _: &str, _: u64) {}
    }

    fn pool(auth: SecretRef) -> PoolSpec {
        PoolSpec {
            name: "p".into(),
            scope: PoolScope::Global,
            org: None,
            user: None,
            repo: None,
            gitea_url: "https://gitea.example.com".into(),
            labels: vec![],
            max_active_runners: 3,
            auth_token: auth,
            registration_token: SecretRef::Value("reg".into()),
            schedule: Default::default(),
        }
    }

    fn engine(source: Result<Vec<i64>, u16>, live: usize) -> (ScalingEngine, Arc<CountingLauncher>) {
        let launcher = Arc::new(CountingLauncher {
            live,
            launched: Mutex::new(0),
        });
        let eng = ScalingEngine::new(
            Arc::new(StaticSource(source)),
            launcher.clone(),
            Arc::new(SpawnCache::default()),
        );
        (eng, launcher)
    }

    #[tokio::test]
    async fn successful_pass_updates_store_and_metrics() {
        let (eng, launcher) = engine(Ok(vec![1, 2]), 1);
        let store = StatusStore::new();
        let spec = pool(SecretRef::Value("api".into()));
        store.register(&spec);
        let rec = Arc::new(RecordingMetrics::default());
        let metrics: MetricsHandle = rec.clone();

        reconcile_once(&spec, &eng, &store, &metrics, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*launcher.launched.lock().unwrap(), 2);
        let st = store.get("p").unwrap();
        assert_eq!(st.active_runners, 1);
        assert_eq!(st.last_pass.unwrap().spawned, 2);
        assert_eq!(*rec.0.lock().unwrap(), vec![PassOutcome::Scaled]);
    }

    #[tokio::test]
    async fn queue_failure_is_recorded_and_fails_the_attempt() {
        let (eng, _) = engine(Err(429), 0);
        let store = StatusStore::new();
        let spec = pool(SecretRef::Value("api".into()));
        store.register(&spec);

        let err = reconcile_once(&spec, &eng, &store, &noop_metrics(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Fail { .. }));
        let st = store.get("p").unwrap();
        assert!(st.last_error.unwrap().contains("rate limit"));
        assert_eq!(st.active_runners, 0);
    }

    #[tokio::test]
    async fn unresolvable_secret_fails_before_fetch() {
        let (eng, launcher) = engine(Ok(vec![1]), 0);
        let store = StatusStore::new();
        let spec = pool(SecretRef::Env("GRUN_TEST_SURELY_UNSET_TOKEN".into()));
        store.register(&spec);

        let err = reconcile_once(&spec, &eng, &store, &noop_metrics(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Fail { .. }));
        assert_eq!(*launcher.launched.lock().unwrap(), 0);
        assert!(store.get("p").unwrap().last_error.is_some());
    }

    #[tokio::test]
    async fn canceled_context_maps_to_canceled() {
        let (eng, _) = engine(Ok(vec![1]), 0);
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = reconcile_once(
            &pool(SecretRef::Value("api".into())),
            &eng,
            &StatusStore::new(),
            &noop_metrics(),
            &ctx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaskError::Canceled));
    }
}
