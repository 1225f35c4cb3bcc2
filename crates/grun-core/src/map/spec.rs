use std::time::Duration;

use grun_model::PoolSchedule;
use taskvisor::{AdmissionPolicy as ControllerAdmission, ControllerSpec, RestartPolicy, TaskRef, TaskSpec};

use super::to_backoff_policy;

/// Periodic task: restarted forever, every attempt bounded by `timeout_ms`.
pub fn to_task_spec(task: TaskRef, s: &PoolSchedule) -> TaskSpec {
    TaskSpec::new(
        task,
        RestartPolicy::Always,
        to_backoff_policy(s),
        Some(Duration::from_millis(s.timeout_ms)),
    )
}

/// Resubmitting a pool replaces the running task of the same slot.
pub fn to_controller_spec(task: TaskRef, s: &PoolSchedule) -> ControllerSpec {
    ControllerSpec {
        admission: ControllerAdmission::Replace,
        task_spec: to_task_spec(task, s),
    }
}
