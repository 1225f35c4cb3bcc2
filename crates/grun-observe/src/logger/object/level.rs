use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::LoggerError;

/// A validated `EnvFilter` expression.
///
/// Stores the raw string from config (e.g. `"info"` or `"grun_core=debug,grun_gitea=trace,info"`)
/// and builds the actual filter on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// # Examples
    /// ```
    /// use grun_observe::LoggerLevel;
    ///
    /// let lvl = LoggerLevel::new("grun_core=debug,info").unwrap();
    /// assert_eq!(lvl.as_str(), "grun_core=debug,info");
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_env_filter(&self) -> EnvFilter {
        // Validated on construction; the fallback is unreachable in practice.
        EnvFilter::try_new(self.as_str()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match EnvFilter::try_new(&s) {
            Ok(_) => Ok(LoggerLevel(s)),
            Err(e) => Err(LoggerError::InvalidLevel(format!("{s}: {e}"))),
        }
    }
}

impl From<LoggerLevel> for String {
    fn from(l: LoggerLevel) -> Self {
        l.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_per_crate_levels() {
        for lvl in ["info", "warn", "trace", "grun_exec=trace,grun_core=debug,info"] {
            let parsed = lvl.parse::<LoggerLevel>();
            assert!(parsed.is_ok(), "{lvl} must parse, got {parsed:?}");
            let _ = parsed.unwrap().to_env_filter();
        }
    }

    #[test]
    fn rejects_unknown_directives() {
        for lvl in ["grun_core=lol", "grun_exec=verbose", "a=trace,b=wat"] {
            assert!(
                matches!(LoggerLevel::from_str(lvl), Err(LoggerError::InvalidLevel(_))),
                "{lvl} must be rejected"
            );
        }
    }

    #[test]
    fn serde_keeps_raw_string() {
        let lvl: LoggerLevel = serde_json::from_str(r#""grun_gitea=trace,info""#).unwrap();
        assert_eq!(lvl.as_str(), "grun_gitea=trace,info");
        assert_eq!(serde_json::to_string(&lvl).unwrap(), r#""grun_gitea=trace,info""#);
    }

    #[test]
    fn default_is_info() {
        assert_eq!(LoggerLevel::default().as_str(), "info");
    }
}
