use std::{collections::BTreeMap, fmt, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::trace;

use crate::ExecError;

fn default_command() -> String {
    "act_runner".to_string()
}

fn default_args() -> Vec<String> {
    vec!["daemon".to_string(), "--once".to_string()]
}

fn default_name_prefix() -> String {
    "grun".to_string()
}

fn default_shutdown_grace_ms() -> u64 {
    10_000
}

/// How runner processes are started.
///
/// ```toml
/// [launcher]
/// command = "/usr/local/bin/act_runner"
/// args = ["daemon", "--once"]
/// name_prefix = "ci"
/// env = { DOCKER_HOST = "unix:///run/docker.sock" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Runner executable.
    pub command: String,
    /// Arguments passed to the runner.
    pub args: Vec<String>,
    /// Extra environment; the `GITEA_*` runner variables always win.
    pub env: BTreeMap<String, String>,
    /// Working directory; inherited when unset.
    pub cwd: Option<PathBuf>,
    /// Prefix of workload names, `{prefix}-{pool}-{seq}`.
    pub name_prefix: String,
    /// How long shutdown waits for killed runners to be reaped.
    pub shutdown_grace_ms: u64,
    /// Forwarding of runner output into the daemon log.
    pub log: LogConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            env: BTreeMap::new(),
            cwd: None,
            name_prefix: default_name_prefix(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            log: LogConfig::default(),
        }
    }
}

impl LauncherConfig {
    /// Validate the configuration before the first launch.
    ///
    /// Rules:
    /// - `command` and `name_prefix` are not empty or whitespace-only.
    /// - extra env keys are not empty and contain no `=`.
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.command.trim().is_empty() {
            return Err(ExecError::InvalidConfig("launcher command is empty".into()));
        }
        if self.name_prefix.trim().is_empty() {
            return Err(ExecError::InvalidConfig("launcher name_prefix is empty".into()));
        }
        if let Some(key) = self.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(ExecError::InvalidConfig(format!("invalid env key '{key}'")));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Emit a trace-level log with the essential configuration fields.
    pub fn trace_state(&self) {
        trace!(
            command = %self.command,
            args = ?self.args,
            cwd = ?self.cwd,
            env_len = self.env.len(),
            prefix = %self.name_prefix,
            "launcher config resolved"
        );
    }
}

impl fmt::Display for LauncherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LauncherConfig(cmd='{}', args={}, env={}, cwd={:?})",
            self.command,
            self.args.len(),
            self.env.len(),
            self.cwd,
        )
    }
}

/// Configuration for runner output logging.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: false,
            stderr_warn: true,
        }
    }
}
