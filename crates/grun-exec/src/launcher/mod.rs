mod config;
mod log;
mod subprocess;

pub use config::{LauncherConfig, LogConfig};
pub use subprocess::SubprocessLauncher;

/// Runner environment variables understood by `act_runner`.
pub const ENV_INSTANCE_URL: &str = "GITEA_INSTANCE_URL";
pub const ENV_REGISTRATION_TOKEN: &str = "GITEA_RUNNER_REGISTRATION_TOKEN";
pub const ENV_EPHEMERAL: &str = "GITEA_RUNNER_EPHEMERAL";
pub const ENV_RUNNER_NAME: &str = "GITEA_RUNNER_NAME";
pub const ENV_RUNNER_LABELS: &str = "GITEA_RUNNER_LABELS";
