use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

/// RFC3339 timestamp formatter in UTC.
///
/// Matches the `lastCheckTime` values reported by the status API, so log lines and
/// pool statuses can be correlated directly.
#[derive(Debug, Clone, Copy)]
pub struct LoggerRfc3339;

impl FormatTime for LoggerRfc3339 {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(ts) => write!(w, "{} ", ts),
            Err(_) => write!(w, "<invalid-time> "),
        }
    }
}
