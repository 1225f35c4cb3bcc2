use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use grun_model::JobId;
use tracing::trace;

/// How long a spawn record is trusted before the job may be served again.
pub const DEFAULT_SPAWN_TTL: Duration = Duration::from_secs(5 * 60);

/// Result of [`SpawnCache::should_spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnVerdict {
    /// A runner was requested recently; it is probably still starting.
    Skip,
    /// A runner was requested but the TTL elapsed; the start presumably failed.
    Retry,
    /// No runner was ever requested for this job.
    New,
}

impl SpawnVerdict {
    /// Returns `true` for verdicts that make the job a spawn candidate.
    #[inline]
    pub fn is_candidate(&self) -> bool {
        !matches!(self, SpawnVerdict::Skip)
    }
}

/// Time-windowed record of jobs a runner was requested for.
///
/// One instance per pool: job ids are only unique within one scope of visibility.
/// All methods take `&self` and are safe to call concurrently.
#[derive(Debug)]
pub struct SpawnCache {
    ttl: Duration,
    entries: Mutex<HashMap<JobId, Instant>>,
}

impl SpawnCache {
    /// Create an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Configured TTL.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Classify a job against the cache at time `now`.
    ///
    /// - entry younger than the TTL -> [`SpawnVerdict::Skip`]
    /// - entry of age `>= TTL`      -> [`SpawnVerdict::Retry`]
    /// - no entry                   -> [`SpawnVerdict::New`]
    pub fn should_spawn(&self, id: JobId, now: Instant) -> SpawnVerdict {
        match self.lock().get(&id) {
            Some(at) if now.saturating_duration_since(*at) < self.ttl => SpawnVerdict::Skip,
            Some(_) => SpawnVerdict::Retry,
            None => SpawnVerdict::New,
        }
    }

    /// Insert or refresh the spawn timestamp of a job.
    pub fn record_spawn(&self, id: JobId, now: Instant) {
        self.lock().insert(id, now);
        trace!(job = id, "spawn recorded");
    }

    /// Drop every entry whose job is no longer pending.
    ///
    /// `current` is the full set of job ids returned by the latest fetch.
    /// Remaining entries keep their timestamps. Returns the number of evicted entries.
    pub fn reconcile(&self, current: &HashSet<JobId>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|id, _| current.contains(id));
        let evicted = before - entries.len();
        if evicted > 0 {
            trace!(evicted, remaining = entries.len(), "spawn cache reconciled");
        }
        evicted
    }

    /// Spawn timestamp of a job, if tracked.
    pub fn spawned_at(&self, id: JobId) -> Option<Instant> {
        self.lock().get(&id).copied()
    }

    /// Returns `true` if the job is tracked, expired or not.
    pub fn contains(&self, id: JobId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still holds a consistent map: every critical section is a single map operation.
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SpawnCache {
    fn default() -> Self {
        Self::new(DEFAULT_SPAWN_TTL)
    }
}
