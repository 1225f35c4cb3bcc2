//! Daemon configuration file.
//!
//! ```toml
//! [logger]
//! format = "json"
//! level = "grun_core=debug,info"
//!
//! [api]
//! listen = "0.0.0.0:8080"
//!
//! [launcher]
//! command = "/usr/local/bin/act_runner"
//!
//! [engine]
//! spawn_ttl_secs = 300
//!
//! [[pools]]
//! name = "linux"
//! scope = "org"
//! org = "acme"
//! giteaUrl = "https://gitea.example.com"
//! labels = ["linux", "x64"]
//! maxActiveRunners = 4
//! authToken = { env = "GITEA_TOKEN" }
//! registrationToken = { file = "/run/secrets/gitea-registration" }
//! schedule = { intervalMs = 15000 }
//! ```

use std::{collections::HashSet, net::SocketAddr, path::Path, time::Duration};

use grun_exec::{ExecError, LauncherConfig};
use grun_gitea::{DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT, GiteaConfig, MAX_PAGE_SIZE};
use grun_model::{DEFAULT_RUNNER_LABELS, ModelError, PoolSpec};
use grun_observe::LoggerConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pool: {0}")]
    Pool(#[from] ModelError),

    #[error(transparent)]
    Launcher(#[from] ExecError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    pub api: ApiConfig,
    pub launcher: LauncherConfig,
    pub engine: EngineConfig,
    pub pools: Vec<PoolSpec>,
}

/// Status API listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Settings shared by the scaling engines of all pools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Labels merged into every pool's capabilities unless overridden by base name.
    pub default_labels: Vec<String>,
    /// How long a spawned job is not spawned again while still queued.
    pub spawn_ttl_secs: u64,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// Honor `HTTP(S)_PROXY` / `NO_PROXY` for queue-service calls.
    pub use_system_proxy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_labels: DEFAULT_RUNNER_LABELS.iter().map(|s| s.to_string()).collect(),
            spawn_ttl_secs: 300,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            use_system_proxy: true,
        }
    }
}

impl EngineConfig {
    pub fn spawn_ttl(&self) -> Duration {
        Duration::from_secs(self.spawn_ttl_secs)
    }

    pub fn gitea_config(&self) -> GiteaConfig {
        GiteaConfig {
            page_size: self.page_size,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            use_system_proxy: self.use_system_proxy,
        }
    }
}

impl AgentConfig {
    /// Read, parse and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse and validate config text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let cfg: AgentConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configs the daemon cannot run with.
    ///
    /// Every pool is validated on its own; pool names must be unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pools.is_empty() {
            return Err(ConfigError::Invalid("no pools configured".into()));
        }
        if self.engine.spawn_ttl_secs == 0 {
            return Err(ConfigError::Invalid("engine.spawn_ttl_secs must be > 0".into()));
        }
        if self.engine.page_size == 0 {
            return Err(ConfigError::Invalid("engine.page_size must be > 0".into()));
        }
        if self.engine.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "engine.page_size must be <= {MAX_PAGE_SIZE}"
            )));
        }
        if self.engine.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "engine.request_timeout_secs must be > 0".into(),
            ));
        }
        self.launcher.validate()?;

        let mut seen = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !seen.insert(pool.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pool name '{}'",
                    pool.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grun_model::{PoolScope, SecretRef, ScopeTarget};
    use grun_observe::LoggerFormat;
    use std::io::Write;

    const POOL: &str = r#"
        [[pools]]
        name = "linux"
        scope = "org"
        org = "acme"
        giteaUrl = "https://gitea.example.com"
        labels = ["linux", "x64"]
        maxActiveRunners = 4
        authToken = { env = "GITEA_TOKEN" }
        registrationToken = { file = "/run/secrets/reg" }
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AgentConfig::parse(POOL).unwrap();

        assert_eq!(cfg.pools.len(), 1);
        let pool = &cfg.pools[0];
        assert_eq!(pool.scope, PoolScope::Org);
        assert_eq!(pool.target().unwrap(), ScopeTarget::Org("acme".into()));
        assert_eq!(pool.auth_token, SecretRef::Env("GITEA_TOKEN".into()));
        assert_eq!(pool.schedule.interval_ms, 10_000);
        assert_eq!(pool.schedule.timeout_ms, 60_000);

        assert!(cfg.api.enabled);
        assert_eq!(cfg.engine.spawn_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.engine.page_size, 50);
        assert_eq!(cfg.engine.default_labels.len(), 3);
        assert_eq!(cfg.launcher.command, "act_runner");
        assert_eq!(cfg.logger.format, LoggerFormat::Text);
    }

    #[test]
    fn sections_override_defaults() {
        let raw = format!(
            r#"
            [logger]
            format = "json"
            level = "grun_core=debug,info"

            [api]
            enabled = false
            listen = "0.0.0.0:9000"

            [launcher]
            command = "/opt/act_runner"
            name_prefix = "ci"

            [engine]
            default_labels = []
            spawn_ttl_secs = 60
            page_size = 10
            request_timeout_secs = 5
            use_system_proxy = false
            {POOL}
            "#
        );
        let cfg = AgentConfig::parse(&raw).unwrap();

        assert_eq!(cfg.logger.format, LoggerFormat::Json);
        assert!(!cfg.api.enabled);
        assert_eq!(cfg.api.listen.port(), 9000);
        assert_eq!(cfg.launcher.command, "/opt/act_runner");
        assert_eq!(cfg.launcher.name_prefix, "ci");
        assert!(cfg.engine.default_labels.is_empty());

        let gitea = cfg.engine.gitea_config();
        assert_eq!(gitea.page_size, 10);
        assert_eq!(gitea.request_timeout, Duration::from_secs(5));
        assert!(!gitea.use_system_proxy);
    }

    #[test]
    fn empty_pool_list_is_rejected() {
        assert!(matches!(AgentConfig::parse(""), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_pool_names_are_rejected() {
        let raw = format!("{POOL}\n{POOL}");
        let err = AgentConfig::parse(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate pool name 'linux'"), "{err}");
    }

    #[test]
    fn invalid_scope_qualifiers_are_rejected() {
        let raw = r#"
            [[pools]]
            name = "bad"
            scope = "global"
            org = "acme"
            giteaUrl = "https://gitea.example.com"
            maxActiveRunners = 1
            authToken = { value = "a" }
            registrationToken = { value = "r" }
        "#;
        assert!(matches!(
            AgentConfig::parse(raw),
            Err(ConfigError::Pool(ModelError::ForbiddenQualifier { .. }))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let raw = POOL.replace(
            "maxActiveRunners = 4",
            "maxActiveRunners = 4\n        schedule = { intervalMs = 0 }",
        );
        assert!(matches!(AgentConfig::parse(&raw), Err(ConfigError::Pool(_))));
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let raw = format!("[metrics]\nenabled = true\n{POOL}");
        assert!(matches!(AgentConfig::parse(&raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn out_of_range_engine_values_are_rejected() {
        for section in [
            "[engine]\nspawn_ttl_secs = 0",
            "[engine]\npage_size = 0",
            "[engine]\npage_size = 51",
            "[engine]\nrequest_timeout_secs = 0",
        ] {
            let raw = format!("{section}\n{POOL}");
            assert!(
                matches!(AgentConfig::parse(&raw), Err(ConfigError::Invalid(_))),
                "{section} must be rejected"
            );
        }
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(POOL.as_bytes()).unwrap();
        let cfg = AgentConfig::load(file.path()).unwrap();
        assert_eq!(cfg.pools[0].name, "linux");

        let err = AgentConfig::load(Path::new("/nonexistent/grun.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
