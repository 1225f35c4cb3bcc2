pub mod cache;
pub mod capability;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod map;
pub mod metrics;
pub mod queue;
pub mod secret;
pub mod state;
pub mod supervisor;

pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, PassOutcome, noop_metrics};
pub use queue::QueueError;

pub mod prelude {
    pub use crate::cache::{Clock, SpawnCache, SpawnVerdict, SystemClock};
    pub use crate::capability::{Capabilities, CapabilityMatcher, LabelRule};
    pub use crate::engine::{PassError, ScalingDecision, ScalingEngine};
    pub use crate::error::CoreError;
    pub use crate::launcher::{LaunchError, LaunchRequest, Launcher};
    pub use crate::queue::{JobSource, QueueError, QueueQuery};
    pub use crate::secret::PoolCredentials;
    pub use crate::state::{PoolStatus, StatusStore};
    pub use crate::supervisor::PoolSupervisor;
}
