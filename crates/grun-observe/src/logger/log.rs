use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logger::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    object::LoggerRfc3339,
};

/// Initializes text logger.
pub fn logger_text(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.level.to_env_filter();
    let fmt_layer = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(LoggerRfc3339);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    init_subscriber(subscriber)
}

/// Initializes JSON logger: one object per line, event fields at top level.
///
/// The enclosing pass span (pool, live count) is attached as `span`.
pub fn logger_json(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.level.to_env_filter();
    let fmt_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(LoggerRfc3339);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    init_subscriber(subscriber)
}

#[cfg(target_os = "linux")]
const JOURNALD_IDENTIFIER: &str = "grun";

/// Initializes journald logger (Linux only).
#[cfg(target_os = "linux")]
pub fn logger_journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.level.to_env_filter();
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?
        .with_syslog_identifier(JOURNALD_IDENTIFIER.to_string());

    let subscriber = tracing_subscriber::registry().with(filter).with(journald);
    init_subscriber(subscriber)
}

/// Stub for journald on non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn logger_journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

/// Installs the subscriber as the global default.
fn init_subscriber<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}
