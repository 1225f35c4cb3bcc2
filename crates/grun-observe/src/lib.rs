//! Logging for the grun daemon.
//!
//! [`init_logger`] installs the global tracing subscriber; with the `subscriber` feature
//! [`Subscriber`] turns supervisor events of the pool tasks into log records.

mod logger;
pub use logger::*;

mod subscriber;

#[cfg(feature = "subscriber")]
pub use subscriber::*;
