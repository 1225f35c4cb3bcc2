//! Subprocess launcher for ephemeral runners.
//!
//! Every launch request starts one runner process (by default `act_runner daemon --once`)
//! that serves a single job and exits.
mod error;
pub use error::ExecError;

pub mod launcher;
pub use launcher::{LauncherConfig, LogConfig, SubprocessLauncher};
