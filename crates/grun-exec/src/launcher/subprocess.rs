use std::{
    collections::HashMap,
    process::Stdio,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use grun_core::launcher::{LaunchError, LaunchRequest, Launcher, make_workload_name};
use tokio::process::Command;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, trace, warn};

use super::{
    ENV_EPHEMERAL, ENV_INSTANCE_URL, ENV_REGISTRATION_TOKEN, ENV_RUNNER_LABELS, ENV_RUNNER_NAME,
    LauncherConfig,
    log::{Stream, forward_lines},
};
use crate::ExecError;

/// Live workloads per pool.
type LiveTable = Arc<Mutex<HashMap<String, Vec<String>>>>;

/// Launcher that starts one ephemeral runner process per request.
///
/// A workload counts as live from a successful spawn until its process exits.
/// [`SubprocessLauncher::shutdown`] kills every child still running.
pub struct SubprocessLauncher {
    config: LauncherConfig,
    live: LiveTable,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl SubprocessLauncher {
    pub fn new(config: LauncherConfig) -> Result<Self, ExecError> {
        config.validate()?;
        config.trace_state();
        Ok(Self {
            config,
            live: Arc::default(),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }

    /// Names of the live workloads of `pool`, in launch order.
    pub fn workloads(&self, pool: &str) -> Vec<String> {
        lock(&self.live).get(pool).cloned().unwrap_or_default()
    }

    /// Kill all runner processes and wait (bounded by the configured grace) until they are reaped.
    ///
    /// Further launches are rejected with [`LaunchError::ShuttingDown`].
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        let grace = self.config.shutdown_grace();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(grace_ms = grace.as_millis() as u64, "runner processes still alive after shutdown grace");
        } else {
            debug!("all runner processes reaped");
        }
    }

    fn build_command(&self, request: &LaunchRequest, workload: &str) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        if let Some(cwd) = &self.config.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.config.env {
            cmd.env(k, v);
        }
        cmd.env(ENV_INSTANCE_URL, &request.gitea_url);
        cmd.env(ENV_REGISTRATION_TOKEN, &request.registration_token);
        cmd.env(ENV_EPHEMERAL, "true");
        cmd.env(ENV_RUNNER_NAME, workload);
        if !request.labels.is_empty() {
            cmd.env(ENV_RUNNER_LABELS, &request.labels);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Launcher for SubprocessLauncher {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    async fn active_count(&self, pool: &str) -> Result<usize, LaunchError> {
        Ok(lock(&self.live).get(pool).map_or(0, Vec::len))
    }

    async fn launch(&self, request: &LaunchRequest) -> Result<String, LaunchError> {
        if self.shutdown.is_cancelled() {
            return Err(LaunchError::ShuttingDown);
        }
        if request.registration_token.is_empty() {
            return Err(LaunchError::InvalidRequest(format!(
                "empty registration token for pool '{}'",
                request.pool
            )));
        }
        let workload = make_workload_name(&self.config.name_prefix, &request.pool);
        trace!(%workload, job = request.job_id, command = %self.config.command, "spawning runner");

        let mut child = self
            .build_command(request, &workload)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                name: workload.clone(),
                reason: e.to_string(),
            })?;

        if let Some(out) = child.stdout.take() {
            self.tracker
                .spawn(forward_lines(out, workload.clone(), Stream::Stdout, self.config.log));
        }
        if let Some(err) = child.stderr.take() {
            self.tracker
                .spawn(forward_lines(err, workload.clone(), Stream::Stderr, self.config.log));
        }

        lock(&self.live)
            .entry(request.pool.clone())
            .or_default()
            .push(workload.clone());

        let live = Arc::clone(&self.live);
        let shutdown = self.shutdown.clone();
        let pool = request.pool.clone();
        let name = workload.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                res = child.wait() => match res {
                    Ok(status) if status.success() => debug!(workload = %name, "runner exited"),
                    Ok(status) => warn!(workload = %name, %status, "runner exited with failure"),
                    Err(e) => warn!(workload = %name, error = %e, "failed to wait for runner"),
                },
                _ = shutdown.cancelled() => {
                    debug!(workload = %name, "shutdown requested; killing runner");
                    if let Err(e) = child.kill().await {
                        debug!(workload = %name, error = %e, "failed to kill runner");
                    }
                }
            }
            release(&live, &pool, &name);
        });

        info!(%workload, pool = %request.pool, job = request.job_id, "runner process started");
        Ok(workload)
    }
}

fn release(live: &LiveTable, pool: &str, workload: &str) {
    let mut table = lock(live);
    if let Some(names) = table.get_mut(pool) {
        names.retain(|n| n != workload);
        if names.is_empty() {
            table.remove(pool);
        }
    }
}

// Every critical section is a single map operation, so a poisoned table is still consistent.
fn lock(live: &LiveTable) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}
