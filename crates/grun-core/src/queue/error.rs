use thiserror::Error;

/// Failure of a queue-service call, categorized by response status.
///
/// Every variant aborts the current pass of the affected pool only.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("authentication failed for {operation}: check the API token")]
    AuthenticationFailed { operation: &'static str },

    #[error("access denied for {operation}: insufficient permissions")]
    AccessDenied { operation: &'static str },

    #[error("resource not found for {operation}: check URL and scope qualifiers")]
    ResourceNotFound { operation: &'static str },

    #[error("rate limit exceeded for {operation}: retry on next pass")]
    RateLimited { operation: &'static str },

    #[error("queue service internal error for {operation}: {body}")]
    RemoteServerError { operation: &'static str, body: String },

    #[error("queue service returned status {status} for {operation}: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("transport error during {operation}: {reason}")]
    Transport {
        operation: &'static str,
        reason: String,
    },

    #[error("malformed response for {operation}: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl QueueError {
    /// Map a non-success HTTP status to its error category.
    pub fn from_status(status: u16, body: impl Into<String>, operation: &'static str) -> Self {
        match status {
            401 => QueueError::AuthenticationFailed { operation },
            403 => QueueError::AccessDenied { operation },
            404 => QueueError::ResourceNotFound { operation },
            429 => QueueError::RateLimited { operation },
            500 => QueueError::RemoteServerError {
                operation,
                body: body.into(),
            },
            _ => QueueError::UnexpectedStatus {
                operation,
                status,
                body: body.into(),
            },
        }
    }

    /// Stable, low-cardinality label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::AuthenticationFailed { .. } => "authentication_failed",
            QueueError::AccessDenied { .. } => "access_denied",
            QueueError::ResourceNotFound { .. } => "resource_not_found",
            QueueError::RateLimited { .. } => "rate_limited",
            QueueError::RemoteServerError { .. } => "remote_server_error",
            QueueError::UnexpectedStatus { .. } => "unexpected_status",
            QueueError::Transport { .. } => "transport",
            QueueError::Decode { .. } => "decode",
            QueueError::InvalidQuery(_) => "invalid_query",
        }
    }
}
