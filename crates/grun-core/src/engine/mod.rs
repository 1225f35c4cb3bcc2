//! Scaling decision engine.
//!
//! One [`ScalingEngine`] per pool drives a single reconciliation pass:
//! capacity check, queue fetch, dedup against the spawn cache, capacity-bounded spawn loop, cache reconcile.
mod decision;
pub use decision::ScalingDecision;

mod error;
pub use error::PassError;

mod pass;
pub use pass::ScalingEngine;
