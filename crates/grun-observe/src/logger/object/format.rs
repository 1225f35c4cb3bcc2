use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::logger::LoggerError;

/// Output format for the logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
#[non_exhaustive]
pub enum LoggerFormat {
    /// Human-readable text logs, colored on a terminal.
    #[default]
    Text,
    /// One JSON object per line, for log collectors.
    Json,
    /// systemd-journald (Linux only).
    Journald,
}

impl LoggerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "journald" | "journal" if cfg!(target_os = "linux") => Ok(Self::Journald),
            "journald" | "journal" => Err(LoggerError::JournaldNotSupported),
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for LoggerFormat {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LoggerFormat> for &'static str {
    fn from(f: LoggerFormat) -> Self {
        f.as_str()
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive() {
        assert_eq!("text".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!(" TEXT ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!("JsOn".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
    }

    #[test]
    fn journald_is_platform_specific() {
        let parsed = "journald".parse::<LoggerFormat>();
        if cfg!(target_os = "linux") {
            assert_eq!(parsed.unwrap(), LoggerFormat::Journald);
        } else {
            assert!(matches!(parsed, Err(LoggerError::JournaldNotSupported)));
        }
    }

    #[test]
    fn rejects_unknown_format() {
        for input in ["", "xml", "logfmt", "text-json"] {
            assert!(
                matches!(input.parse::<LoggerFormat>(), Err(LoggerError::InvalidFormat(_))),
                "{input:?} must be rejected"
            );
        }
    }

    #[test]
    fn serde_uses_canonical_names() {
        assert_eq!(serde_json::to_string(&LoggerFormat::Json).unwrap(), r#""json""#);
        let parsed: LoggerFormat = serde_json::from_str(r#""Text""#).unwrap();
        assert_eq!(parsed, LoggerFormat::Text);
        assert!(serde_json::from_str::<LoggerFormat>(r#""yaml""#).is_err());
    }
}
