use grun_model::ModelError;
use thiserror::Error;

use crate::{engine::PassError, launcher::LaunchError, secret::SecretError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid pool: {0}")]
    Model(#[from] ModelError),

    #[error("secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("launcher error: {0}")]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Pass(#[from] PassError),

    #[error("supervisor error: {0}")]
    Supervisor(String),
}

impl CoreError {
    /// Returns `true` if the error only reflects a cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, CoreError::Pass(PassError::Canceled))
    }
}
