use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Where a credential is read from.
///
/// Resolution happens on every pass, so rotated files or env values are picked up without restart.
///
/// ```toml
/// authToken = { env = "GITEA_TOKEN" }
/// registrationToken = { file = "/run/secrets/gitea-registration" }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum SecretRef {
    /// Read from an environment variable of the daemon process.
    Env(String),
    /// Read from a file; surrounding whitespace is trimmed.
    File(String),
    /// Literal value, mostly for local setups and tests.
    Value(String),
}

impl SecretRef {
    /// Check that the reference itself is usable (not whether the secret exists).
    pub fn validate(&self) -> ModelResult<()> {
        let (kind, target) = match self {
            SecretRef::Env(v) => ("env", v),
            SecretRef::File(v) => ("file", v),
            SecretRef::Value(v) => ("value", v),
        };
        if target.trim().is_empty() {
            return Err(ModelError::InvalidSecret(format!("{kind} reference is empty")));
        }
        Ok(())
    }
}

// Literal values must never end up in logs.
impl std::fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretRef::Env(name) => write!(f, "SecretRef::Env({name})"),
            SecretRef::File(path) => write!(f, "SecretRef::File({path})"),
            SecretRef::Value(_) => f.write_str("SecretRef::Value(<redacted>)"),
        }
    }
}
