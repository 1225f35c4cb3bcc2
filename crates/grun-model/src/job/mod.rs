mod queued;
pub use queued::QueuedJob;

mod status;
pub use status::{JobStatus, PendingStatus};
