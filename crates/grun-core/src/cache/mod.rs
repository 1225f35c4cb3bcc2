//! Spawn deduplication.
//!
//! Remembers for which jobs a runner was already requested, so a job that stays queued while its runner
//! is still starting is not served twice. Entries expire after a TTL, after which one retry is allowed.
mod clock;
pub use clock::{Clock, SystemClock};

mod spawn;
pub use spawn::{DEFAULT_SPAWN_TTL, SpawnCache, SpawnVerdict};
