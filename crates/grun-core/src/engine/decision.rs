use grun_model::JobId;

use crate::metrics::PassOutcome;

/// Result of one reconciliation pass, kept for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingDecision {
    /// Live workloads at pass start.
    pub active: usize,
    /// Configured capacity of the pool.
    pub max: usize,
    /// `max - active`, saturating at zero.
    pub available_slots: usize,
    /// Matching pending jobs returned by the queue.
    pub fetched: usize,
    /// Jobs eligible for a spawn (`New` or `Retry`), in fetch order.
    pub candidates: Vec<JobId>,
    /// Jobs a workload was launched for, in launch order.
    pub spawned: Vec<JobId>,
    /// Jobs skipped because a recent spawn is still in flight.
    pub skipped: usize,
    /// Cache entries evicted by the reconcile step.
    pub evicted: usize,
    pub outcome: PassOutcome,
}

impl ScalingDecision {
    /// Decision for a pool that is already full; no fetch happened.
    pub fn at_capacity(active: usize, max: usize) -> Self {
        Self {
            active,
            max,
            available_slots: 0,
            fetched: 0,
            candidates: Vec::new(),
            spawned: Vec::new(),
            skipped: 0,
            evicted: 0,
            outcome: PassOutcome::AtCapacity,
        }
    }
}
