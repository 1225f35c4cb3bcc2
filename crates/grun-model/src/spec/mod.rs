mod pool;
pub use pool::PoolSpec;

mod schedule;
pub use schedule::PoolSchedule;

mod scope;
pub use scope::{PoolScope, ScopeTarget};
