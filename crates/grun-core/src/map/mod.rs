//! Mapping of pool schedules onto taskvisor policies.
mod backoff;
mod spec;

pub use backoff::to_backoff_policy;
pub use spec::{to_controller_spec, to_task_spec};
