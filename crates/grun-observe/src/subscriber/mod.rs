#![cfg(feature = "subscriber")]

//! Supervisor event logging.
//!
//! Every pool runs as one supervised task named after the pool, so task events are logged
//! with a `pool` field.

use async_trait::async_trait;
use taskvisor::{Event, EventKind, Subscribe};
use tracing::{debug, error, info, trace, warn};

/// Bounded queue of the subscriber worker; overflow drops events instead of blocking.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 2048;

/// Subscriber that logs supervisor events through `tracing`.
#[derive(Debug, Default)]
pub struct Subscriber;

#[async_trait]
impl Subscribe for Subscriber {
    async fn on_event(&self, event: &Event) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "log-subscriber"
    }

    fn queue_capacity(&self) -> usize {
        SUBSCRIBER_QUEUE_CAPACITY
    }
}

fn log_event(e: &Event) {
    let pool = e.task.as_deref().unwrap_or("-");
    let reason = e.reason.as_deref().unwrap_or("-");
    let attempt = e.attempt.unwrap_or(0);
    let msg = message_for(e.kind);

    match e.kind {
        EventKind::TaskAddRequested | EventKind::TaskRemoveRequested | EventKind::TaskRemoved => {
            trace!(pool, "{msg}")
        }
        EventKind::TaskAdded => debug!(pool, "{msg}"),

        EventKind::ShutdownRequested | EventKind::AllStoppedWithinGrace => info!("{msg}"),
        EventKind::GraceExceeded => warn!("{msg}"),

        EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
            error!(subscriber = pool, reason, "{msg}")
        }

        EventKind::ActorExhausted => warn!(pool, reason, "{msg}"),
        EventKind::ActorDead => error!(pool, reason, "{msg}"),

        EventKind::TimeoutHit => warn!(pool, timeout_ms = e.timeout_ms.unwrap_or(0), "{msg}"),
        // One start per pass; routine.
        EventKind::TaskStarting => trace!(pool, attempt, "{msg}"),
        EventKind::TaskStopped => trace!(pool, "{msg}"),
        EventKind::TaskFailed => warn!(pool, attempt, reason, "{msg}"),

        EventKind::BackoffScheduled => {
            let delay_ms = e.delay_ms.unwrap_or(0);
            if e.reason.is_some() {
                debug!(pool, attempt, delay_ms, reason, "pass failed; retry scheduled");
            } else {
                trace!(pool, delay_ms, "next pass scheduled");
            }
        }

        EventKind::ControllerRejected => warn!(pool, reason, "{msg}"),
        EventKind::ControllerSubmitted => debug!(pool, "{msg}"),
        EventKind::ControllerSlotTransition => trace!(pool, reason, "{msg}"),
    }
}

fn message_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::TaskAdded => "pool task registered",
        EventKind::TaskRemoved => "pool task removed",
        EventKind::TaskRemoveRequested => "pool task removal requested",
        EventKind::TaskAddRequested => "pool task requested",

        EventKind::GraceExceeded => "grace exceeded; some pool tasks did not stop in time",
        EventKind::AllStoppedWithinGrace => "all pool tasks stopped within grace period",
        EventKind::ShutdownRequested => "shutdown requested",

        EventKind::SubscriberOverflow => "event dropped for a subscriber",
        EventKind::SubscriberPanicked => "subscriber panicked while processing an event",

        EventKind::ActorExhausted => "pool task exhausted its restart policy",
        EventKind::ActorDead => "pool task terminated permanently",

        EventKind::TaskStopped => "pass finished",
        EventKind::TaskFailed => "pass failed",
        EventKind::TimeoutHit => "pass exceeded its timeout",
        EventKind::BackoffScheduled => "next pass scheduled",
        EventKind::TaskStarting => "pass starting",

        EventKind::ControllerRejected => "pool submission rejected",
        EventKind::ControllerSubmitted => "pool submitted",
        EventKind::ControllerSlotTransition => "pool slot transition",
    }
}
