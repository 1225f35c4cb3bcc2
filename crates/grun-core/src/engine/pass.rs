use std::{collections::HashSet, fmt, sync::Arc};

use grun_model::{DEFAULT_RUNNER_LABELS, PoolSpec, QueuedJob};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::{Clock, SpawnCache, SpawnVerdict, SystemClock},
    capability::Capabilities,
    engine::{PassError, ScalingDecision},
    launcher::{LaunchRequest, Launcher},
    metrics::{MetricsHandle, PassOutcome, noop_metrics},
    queue::{JobSource, QueueQuery},
    secret::PoolCredentials,
};

/// Runs reconciliation passes for one pool.
///
/// The engine owns no state between passes except the pool's [`SpawnCache`].
/// Passes of the same pool are expected to be serialized by the caller; the cache stays consistent even if they are not.
pub struct ScalingEngine {
    source: Arc<dyn JobSource>,
    launcher: Arc<dyn Launcher>,
    cache: Arc<SpawnCache>,
    clock: Arc<dyn Clock>,
    metrics: MetricsHandle,
    default_labels: Vec<String>,
}

impl ScalingEngine {
    /// Create an engine with the system clock, no-op metrics and the built-in default labels.
    pub fn new(source: Arc<dyn JobSource>, launcher: Arc<dyn Launcher>, cache: Arc<SpawnCache>) -> Self {
        Self {
            source,
            launcher,
            cache,
            clock: Arc::new(SystemClock),
            metrics: noop_metrics(),
            default_labels: DEFAULT_RUNNER_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the labels merged into every pool's declared labels.
    pub fn with_default_labels(mut self, labels: Vec<String>) -> Self {
        self.default_labels = labels;
        self
    }

    /// Spawn cache of this pool.
    pub fn cache(&self) -> &Arc<SpawnCache> {
        &self.cache
    }

    /// Launcher used by this engine.
    pub fn launcher(&self) -> &Arc<dyn Launcher> {
        &self.launcher
    }

    /// Run one reconciliation pass.
    ///
    /// Steps:
    /// 1. Return [`PassOutcome::AtCapacity`] without any remote call if `live >= max`.
    /// 2. Fetch matching pending jobs for the effective capabilities.
    /// 3. Select `New`/`Retry` jobs in fetch order; repeated ids within the pass are skipped.
    /// 4. Launch at most `max - live` workloads; the first launch failure stops the loop.
    /// 5. Drop cache entries of jobs that are no longer pending.
    ///
    /// Cancellation aborts the fetch, or stops the spawn loop before the next launch; nothing is reconciled in that case.
    #[instrument(level = "debug", skip_all, fields(pool = %pool.name, live = live))]
    pub async fn run_pass(
        &self,
        pool: &PoolSpec,
        creds: &PoolCredentials,
        live: usize,
        cancel: &CancellationToken,
    ) -> Result<ScalingDecision, PassError> {
        let max = pool.max_active_runners;
        self.metrics.set_active(&pool.name, live as u64);

        if live >= max {
            debug!(max, "pool at capacity; skipping fetch");
            return Ok(ScalingDecision::at_capacity(live, max));
        }
        if cancel.is_cancelled() {
            return Err(PassError::Canceled);
        }

        let capabilities = Capabilities::effective(&pool.labels, &self.default_labels);
        let query = QueueQuery {
            base_url: pool.gitea_url.clone(),
            token: creds.auth_token.clone(),
            target: pool.target()?,
            capabilities,
        };

        let jobs = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PassError::Canceled),
            res = self.source.fetch_queued(&query) => res,
        };
        let jobs = match jobs {
            Ok(jobs) => jobs,
            Err(e) => {
                self.metrics.record_queue_error(&pool.name, e.kind());
                return Err(e.into());
            }
        };
        self.metrics.set_pending(&pool.name, jobs.len() as u64);

        let now = self.clock.now();
        let mut fetched = HashSet::with_capacity(jobs.len());
        let mut candidates: Vec<&QueuedJob> = Vec::new();
        let mut skipped = 0usize;

        for job in &jobs {
            if !fetched.insert(job.id) {
                debug!(job = job.id, "duplicate job id in fetch; already handled this pass");
                continue;
            }
            match self.cache.should_spawn(job.id, now) {
                SpawnVerdict::Skip => skipped += 1,
                SpawnVerdict::Retry => {
                    warn!(job = job.id, "previous runner did not pick up job within ttl; retrying");
                    candidates.push(job);
                }
                SpawnVerdict::New => candidates.push(job),
            }
        }

        let available_slots = max - live;
        let labels = query.capabilities.joined();
        let mut spawned = Vec::new();
        let mut failure = None;

        for job in candidates.iter().take(available_slots) {
            // A launch that has started runs to completion so its spawn is recorded.
            if cancel.is_cancelled() {
                debug!(spawned = spawned.len(), "pass canceled between launches");
                self.metrics.record_spawned(&pool.name, spawned.len() as u64);
                return Err(PassError::Canceled);
            }
            let request = LaunchRequest {
                pool: pool.name.clone(),
                gitea_url: pool.gitea_url.clone(),
                labels: labels.clone(),
                registration_token: creds.registration_token.clone(),
                job_id: job.id,
            };
            match self.launcher.launch(&request).await {
                Ok(workload) => {
                    self.cache.record_spawn(job.id, self.clock.now());
                    info!(job = job.id, %workload, "runner launched");
                    spawned.push(job.id);
                }
                Err(e) => {
                    warn!(job = job.id, error = %e, "runner launch failed; stopping spawn loop");
                    failure = Some((job.id, e));
                    break;
                }
            }
        }
        self.metrics.record_spawned(&pool.name, spawned.len() as u64);

        let evicted = self.cache.reconcile(&fetched);
        if let Some((job_id, source)) = failure {
            return Err(PassError::Launch {
                job_id,
                spawned: spawned.len(),
                source,
            });
        }

        let outcome = if spawned.is_empty() {
            PassOutcome::Idle
        } else {
            PassOutcome::Scaled
        };
        debug!(
            fetched = jobs.len(),
            candidates = candidates.len(),
            spawned = spawned.len(),
            skipped,
            evicted,
            "pass finished"
        );

        Ok(ScalingDecision {
            active: live,
            max,
            available_slots,
            fetched: jobs.len(),
            candidates: candidates.iter().map(|j| j.id).collect(),
            spawned,
            skipped,
            evicted,
            outcome,
        })
    }
}

impl fmt::Debug for ScalingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalingEngine")
            .field("source", &self.source.name())
            .field("launcher", &self.launcher.name())
            .field("cache_len", &self.cache.len())
            .field("default_labels", &self.default_labels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::{Duration, Instant},
    };

    use async_trait::async_trait;
    use grun_model::{JobId, PoolScope, SecretRef};

    use crate::{cache::DEFAULT_SPAWN_TTL, launcher::LaunchError, queue::QueueError};

    #[derive(Default)]
    struct FakeSource {
        jobs: Mutex<Vec<QueuedJob>>,
        fail: Mutex<Option<u16>>,
        calls: AtomicUsize,
        last_labels: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_ids(ids: &[JobId]) -> Arc<Self> {
            let src = Self::default();
            src.set(ids);
            Arc::new(src)
        }

        fn set(&self, ids: &[JobId]) {
            *self.jobs.lock().unwrap() = ids
                .iter()
                .map(|id| QueuedJob::new(*id, ["ubuntu-latest"]))
                .collect();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_queued(&self, query: &QueueQuery) -> Result<Vec<QueuedJob>, QueueError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_labels.lock().unwrap() = query.capabilities.iter().map(String::from).collect();
            if let Some(status) = *self.fail.lock().unwrap() {
                return Err(QueueError::from_status(status, "boom", "fetch queued jobs"));
            }
            Ok(self.jobs.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launched: Mutex<Vec<LaunchRequest>>,
        fail_on_call: Option<usize>,
    }

    impl FakeLauncher {
        fn failing_on(n: usize) -> Arc<Self> {
            Arc::new(Self {
                fail_on_call: Some(n),
                ..Default::default()
            })
        }

        fn job_ids(&self) -> Vec<JobId> {
            self.launched.lock().unwrap().iter().map(|r| r.job_id).collect()
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn active_count(&self, _: &str) -> Result<usize, LaunchError> {
            Ok(0)
        }

        async fn launch(&self, request: &LaunchRequest) -> Result<String, LaunchError> {
            let mut launched = self.launched.lock().unwrap();
            if self.fail_on_call == Some(launched.len()) {
                return Err(LaunchError::Spawn {
                    name: "w".into(),
                    reason: "no capacity".into(),
                });
            }
            launched.push(request.clone());
            Ok(format!("w-{}", request.job_id))
        }
    }

    struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Instant::now())))
        }

        fn advance(&self, d: Duration) {
            *self.0.lock().unwrap() += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    fn pool(max: usize) -> PoolSpec {
        PoolSpec {
            name: "linux".into(),
            scope: PoolScope::Org,
            org: Some("acme".into()),
            user: None,
            repo: None,
            gitea_url: "https://gitea.example.com".into(),
            labels: vec!["ubuntu-latest:host".into()],
            max_active_runners: max,
            auth_token: SecretRef::Value("api".into()),
            registration_token: SecretRef::Value("reg".into()),
            schedule: Default::default(),
        }
    }

    fn creds() -> PoolCredentials {
        PoolCredentials {
            auth_token: "api".into(),
            registration_token: "reg".into(),
        }
    }

    fn engine(
        source: &Arc<FakeSource>,
        launcher: &Arc<FakeLauncher>,
        clock: &Arc<ManualClock>,
    ) -> ScalingEngine {
        ScalingEngine::new(
            source.clone(),
            launcher.clone(),
            Arc::new(SpawnCache::new(DEFAULT_SPAWN_TTL)),
        )
        .with_clock(clock.clone())
    }

    #[tokio::test]
    async fn full_pool_short_circuits_before_fetch() {
        let source = FakeSource::with_ids(&[1, 2]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());

        let d = eng
            .run_pass(&pool(5), &creds(), 5, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.outcome, PassOutcome::AtCapacity);
        assert_eq!(source.calls(), 0);
        assert!(launcher.job_ids().is_empty());
    }

    #[tokio::test]
    async fn spawns_first_candidates_up_to_free_slots() {
        let source = FakeSource::with_ids(&[10, 11, 12, 13]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());

        let d = eng
            .run_pass(&pool(5), &creds(), 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.available_slots, 3);
        assert_eq!(d.spawned, vec![10, 11, 12]);
        assert_eq!(launcher.job_ids(), vec![10, 11, 12]);
        assert!(eng.cache().contains(10) && eng.cache().contains(12));
        assert!(!eng.cache().contains(13));
        assert_eq!(d.outcome, PassOutcome::Scaled);
    }

    #[tokio::test]
    async fn recent_spawn_is_skipped_and_retried_after_ttl() {
        let source = FakeSource::with_ids(&[42]);
        let launcher = Arc::new(FakeLauncher::default());
        let clock = ManualClock::new();
        let eng = engine(&source, &launcher, &clock);
        let cancel = CancellationToken::new();

        eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap();
        let t0 = eng.cache().spawned_at(42).unwrap();

        clock.advance(Duration::from_secs(4 * 60));
        let d = eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap();
        assert!(d.spawned.is_empty());
        assert_eq!(d.skipped, 1);
        assert_eq!(d.outcome, PassOutcome::Idle);

        clock.advance(Duration::from_secs(2 * 60));
        let d = eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap();
        assert_eq!(d.spawned, vec![42]);
        assert_eq!(launcher.job_ids(), vec![42, 42]);
        assert_eq!(eng.cache().spawned_at(42), Some(t0 + Duration::from_secs(6 * 60)));
    }

    #[tokio::test]
    async fn job_that_left_the_queue_is_evicted() {
        let source = FakeSource::with_ids(&[7, 8]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());
        let cancel = CancellationToken::new();

        eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap();
        assert!(eng.cache().contains(7));

        source.set(&[8]);
        let d = eng.run_pass(&pool(5), &creds(), 2, &cancel).await.unwrap();
        assert_eq!(d.evicted, 1);
        assert!(!eng.cache().contains(7));
        assert!(eng.cache().contains(8));
    }

    #[tokio::test]
    async fn duplicate_ids_within_a_pass_spawn_once() {
        let source = FakeSource::with_ids(&[5, 5, 6]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());

        let d = eng
            .run_pass(&pool(5), &creds(), 0, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(d.candidates, vec![5, 6]);
        assert_eq!(launcher.job_ids(), vec![5, 6]);
    }

    #[tokio::test]
    async fn spawn_count_never_exceeds_free_slots() {
        let ids: Vec<JobId> = (1..=20).collect();
        for live in 0..=6 {
            let source = FakeSource::with_ids(&ids);
            let launcher = Arc::new(FakeLauncher::default());
            let eng = engine(&source, &launcher, &ManualClock::new());

            let d = eng
                .run_pass(&pool(4), &creds(), live, &CancellationToken::new())
                .await
                .unwrap();
            assert!(d.spawned.len() <= 4usize.saturating_sub(live));
            assert_eq!(launcher.job_ids().len(), d.spawned.len());
        }
    }

    #[tokio::test]
    async fn launch_failure_stops_loop_but_keeps_earlier_spawns() {
        let source = FakeSource::with_ids(&[1, 2, 3]);
        let launcher = FakeLauncher::failing_on(1);
        let eng = engine(&source, &launcher, &ManualClock::new());

        let err = eng
            .run_pass(&pool(5), &creds(), 0, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PassError::Launch { job_id: 2, spawned: 1, .. }));
        assert_eq!(launcher.job_ids(), vec![1]);
        assert!(eng.cache().contains(1));
        assert!(!eng.cache().contains(2));
    }

    #[tokio::test]
    async fn queue_error_propagates_and_leaves_cache_untouched() {
        let source = FakeSource::with_ids(&[1]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());
        eng.cache().record_spawn(99, Instant::now());

        *source.fail.lock().unwrap() = Some(401);
        let err = eng
            .run_pass(&pool(5), &creds(), 0, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PassError::Queue(QueueError::AuthenticationFailed { .. })
        ));
        assert!(eng.cache().contains(99));
        assert!(launcher.job_ids().is_empty());
    }

    #[tokio::test]
    async fn canceled_pass_does_nothing() {
        let source = FakeSource::with_ids(&[1]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());
        eng.cache().record_spawn(99, Instant::now());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap_err();

        assert!(matches!(err, PassError::Canceled));
        assert!(launcher.job_ids().is_empty());
        assert!(eng.cache().contains(99));
    }

    struct HangingSource;

    #[async_trait]
    impl JobSource for HangingSource {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn fetch_queued(&self, _: &QueueQuery) -> Result<Vec<QueuedJob>, QueueError> {
            std::future::pending().await
        }
    }

    /// Cancels the pass while its first launch is in flight.
    struct CancelingLauncher {
        cancel: CancellationToken,
        launched: Mutex<Vec<JobId>>,
    }

    #[async_trait]
    impl Launcher for CancelingLauncher {
        fn name(&self) -> &'static str {
            "canceling"
        }

        async fn active_count(&self, _: &str) -> Result<usize, LaunchError> {
            Ok(0)
        }

        async fn launch(&self, request: &LaunchRequest) -> Result<String, LaunchError> {
            self.cancel.cancel();
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.launched.lock().unwrap().push(request.job_id);
            Ok(format!("w-{}", request.job_id))
        }
    }

    #[tokio::test]
    async fn cancel_during_hanging_fetch_returns_canceled() {
        let launcher = Arc::new(FakeLauncher::default());
        let eng = ScalingEngine::new(
            Arc::new(HangingSource),
            launcher.clone(),
            Arc::new(SpawnCache::new(DEFAULT_SPAWN_TTL)),
        );
        eng.cache().record_spawn(99, Instant::now());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            eng.run_pass(&pool(5), &creds(), 0, &cancel),
        )
        .await
        .expect("pass must return once canceled")
        .unwrap_err();

        assert!(matches!(err, PassError::Canceled));
        assert!(launcher.job_ids().is_empty());
        assert_eq!(eng.cache().len(), 1);
        assert!(eng.cache().contains(99));
    }

    #[tokio::test]
    async fn cancel_mid_launch_records_started_spawn_and_stops() {
        let cancel = CancellationToken::new();
        let launcher = Arc::new(CancelingLauncher {
            cancel: cancel.clone(),
            launched: Mutex::new(Vec::new()),
        });
        let eng = ScalingEngine::new(
            FakeSource::with_ids(&[1, 2, 3]),
            launcher.clone(),
            Arc::new(SpawnCache::new(DEFAULT_SPAWN_TTL)),
        );
        eng.cache().record_spawn(99, Instant::now());

        let err = eng.run_pass(&pool(5), &creds(), 0, &cancel).await.unwrap_err();

        assert!(matches!(err, PassError::Canceled));
        assert_eq!(*launcher.launched.lock().unwrap(), vec![1]);
        assert!(eng.cache().contains(1));
        assert!(!eng.cache().contains(2));
        // No reconcile: the stale entry survives.
        assert!(eng.cache().contains(99));
    }

    #[tokio::test]
    async fn launch_request_carries_effective_labels() {
        let source = FakeSource::with_ids(&[3]);
        let launcher = Arc::new(FakeLauncher::default());
        let eng = engine(&source, &launcher, &ManualClock::new());

        eng.run_pass(&pool(1), &creds(), 0, &CancellationToken::new())
            .await
            .unwrap();

        let req = launcher.launched.lock().unwrap()[0].clone();
        assert_eq!(
            req.labels,
            "ubuntu-latest:host,ubuntu-22.04:docker://node:16-bullseye,ubuntu-20.04:docker://node:16-bullseye"
        );
        assert_eq!(req.registration_token, "reg");
        assert_eq!(req.pool, "linux");
        assert_eq!(source.last_labels.lock().unwrap().len(), 3);
    }
}
