use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid launch request: {0}")]
    InvalidRequest(String),

    #[error("failed to spawn workload '{name}': {reason}")]
    Spawn { name: String, reason: String },

    #[error("launcher is shutting down")]
    ShuttingDown,
}

impl LaunchError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LaunchError::InvalidRequest(_) => "invalid_request",
            LaunchError::Spawn { .. } => "spawn",
            LaunchError::ShuttingDown => "shutting_down",
        }
    }
}
