use std::time::Duration;

use grun_model::PoolSchedule;
use taskvisor::{BackoffPolicy, JitterPolicy};

/// Fixed-interval policy: the next pass starts `interval_ms` after the previous one ended,
/// whether it succeeded or failed.
pub fn to_backoff_policy(s: &PoolSchedule) -> BackoffPolicy {
    let interval = Duration::from_millis(s.interval_ms);
    BackoffPolicy {
        success_delay: Some(interval),
        first: interval,
        max: interval,
        jitter: JitterPolicy::None,
        factor: 1.0,
    }
}
