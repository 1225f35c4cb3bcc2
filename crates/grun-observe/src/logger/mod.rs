mod config;
mod error;
mod log;
mod object;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::LoggerFormat;
pub use object::LoggerLevel;

/// Initializes the global tracing subscriber with the given configuration.
///
/// Once installed, all `tracing` macros (`info!`, `debug!`, etc.) go through it.
/// A second call fails with [`LoggerError::AlreadyInitialized`].
///
/// # Examples
/// ```rust
/// use grun_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("Failed to initialize logger");
///
/// tracing::info!("logger initialized");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::logger_text(cfg),
        LoggerFormat::Json => log::logger_json(cfg),
        LoggerFormat::Journald => log::logger_journald(cfg),
    }
}
