use async_trait::async_trait;
use taskvisor::{Event, EventKind, Subscribe};
use tracing::trace;

use super::StatusStore;

/// Subscriber that mirrors supervisor-level failures into the [`StatusStore`].
///
/// Pool tasks record their own results; this covers what they cannot see themselves
/// (pass timeouts enforced by the supervisor, panics, removed pools).
pub struct StateSubscriber {
    store: StatusStore,
}

impl StateSubscriber {
    pub fn new(store: StatusStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Subscribe for StateSubscriber {
    async fn on_event(&self, event: &Event) {
        let Some(pool) = event.task.as_deref() else {
            return;
        };

        match event.kind {
            EventKind::TimeoutHit => {
                trace!(pool, "pass timeout");
                self.store.record_failure(pool, None, "pass timed out");
            }
            EventKind::ActorExhausted | EventKind::ActorDead => {
                let reason = event
                    .reason
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "pool task stopped".to_string());
                trace!(pool, reason = %reason, "pool task gone");
                self.store.set_error(pool, reason);
            }
            EventKind::TaskRemoved => {
                trace!(pool, "pool removed from status");
                self.store.remove(pool);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "state-subscriber"
    }

    fn queue_capacity(&self) -> usize {
        2048
    }
}
