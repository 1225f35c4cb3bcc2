//! In-memory status of every scheduled pool.
//!
//! Written by pool tasks and the [`StateSubscriber`], read by the status API.
mod status;
pub use status::{PassSummary, PoolStatus};

mod subscriber;
pub use subscriber::StateSubscriber;

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use grun_model::PoolSpec;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::engine::ScalingDecision;

/// Shared, clonable handle to the pool status table.
#[derive(Clone, Debug, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<String, PoolStatus>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh status for `spec`, replacing any previous one.
    pub fn register(&self, spec: &PoolSpec) {
        let scope = spec
            .target()
            .map(|t| t.to_string())
            .unwrap_or_else(|_| spec.scope.to_string());
        self.write().insert(
            spec.name.clone(),
            PoolStatus {
                name: spec.name.clone(),
                scope,
                active_runners: 0,
                max_active_runners: spec.max_active_runners,
                last_check_time: None,
                last_pass: None,
                last_error: None,
                passes: 0,
            },
        );
    }

    /// Record a successful pass.
    pub fn record_decision(&self, pool: &str, decision: &ScalingDecision) {
        let now = now_rfc3339();
        if let Some(st) = self.write().get_mut(pool) {
            st.active_runners = decision.active;
            st.max_active_runners = decision.max;
            st.last_check_time = now;
            st.last_pass = Some(PassSummary::from(decision));
            st.last_error = None;
            st.passes += 1;
        }
    }

    /// Record a failed pass; `active` is set when the live count was known.
    pub fn record_failure(&self, pool: &str, active: Option<usize>, error: impl Into<String>) {
        let now = now_rfc3339();
        if let Some(st) = self.write().get_mut(pool) {
            if let Some(active) = active {
                st.active_runners = active;
            }
            st.last_check_time = now;
            st.last_error = Some(error.into());
            st.passes += 1;
        }
    }

    /// Set the last error without counting a pass (e.g. supervisor-level timeout).
    pub fn set_error(&self, pool: &str, error: impl Into<String>) {
        if let Some(st) = self.write().get_mut(pool) {
            st.last_error = Some(error.into());
        }
    }

    pub fn get(&self, pool: &str) -> Option<PoolStatus> {
        self.read().get(pool).cloned()
    }

    /// All statuses ordered by pool name.
    pub fn list(&self) -> Vec<PoolStatus> {
        let mut out: Vec<PoolStatus> = self.read().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn remove(&self, pool: &str) -> Option<PoolStatus> {
        self.write().remove(pool)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PoolStatus>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PoolStatus>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_rfc3339() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}
