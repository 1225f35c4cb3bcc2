//! Resolution of [`SecretRef`] values.
//!
//! Secrets are resolved on every pass so rotated tokens are picked up without a restart.
use std::fmt;

use grun_model::SecretRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("environment variable '{0}' is not set or not unicode")]
    MissingEnv(String),

    #[error("failed to read secret file '{path}': {reason}")]
    File { path: String, reason: String },

    #[error("secret from {0} is empty")]
    Empty(String),
}

/// Tokens needed for one pass of a pool.
#[derive(Clone)]
pub struct PoolCredentials {
    /// Token used to poll the queue service.
    pub auth_token: String,
    /// Token handed to launched runners.
    pub registration_token: String,
}

impl fmt::Debug for PoolCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolCredentials")
            .field("auth_token", &"<redacted>")
            .field("registration_token", &"<redacted>")
            .finish()
    }
}

/// Resolve a single secret reference.
///
/// File contents are trimmed; an empty result is an error.
pub async fn resolve_secret(secret: &SecretRef) -> Result<String, SecretError> {
    let (value, origin) = match secret {
        SecretRef::Env(name) => {
            let v = std::env::var(name).map_err(|_| SecretError::MissingEnv(name.clone()))?;
            (v, format!("env '{name}'"))
        }
        SecretRef::File(path) => {
            let v = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SecretError::File {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            (v, format!("file '{path}'"))
        }
        SecretRef::Value(v) => (v.clone(), "inline value".to_string()),
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(SecretError::Empty(origin));
    }
    Ok(value.to_string())
}

/// Resolve both tokens of a pool.
pub async fn resolve_credentials(
    auth: &SecretRef,
    registration: &SecretRef,
) -> Result<PoolCredentials, SecretError> {
    Ok(PoolCredentials {
        auth_token: resolve_secret(auth).await?,
        registration_token: resolve_secret(registration).await?,
    })
}
