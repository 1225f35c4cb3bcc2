use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Breadth of the queue query for a pool.
///
/// - `Global`: every job of the queue-service instance (admin endpoint).
/// - `Org`: jobs of all repositories of one organization.
/// - `User`: jobs of all repositories owned by one user.
/// - `Repo`: jobs of a single repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum PoolScope {
    Global,
    Org,
    User,
    Repo,
}

impl PoolScope {
    /// Returns the scope as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolScope::Global => "global",
            PoolScope::Org => "org",
            PoolScope::User => "user",
            PoolScope::Repo => "repo",
        }
    }
}

impl FromStr for PoolScope {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(PoolScope::Global),
            "org" | "organization" => Ok(PoolScope::Org),
            "user" => Ok(PoolScope::User),
            "repo" | "repository" => Ok(PoolScope::Repo),
            other => Err(ModelError::UnknownScope(other.to_string())),
        }
    }
}

impl fmt::Display for PoolScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved query target of a pool: the scope together with its qualifiers.
///
/// Built by [`crate::PoolSpec::target`], which enforces the qualifier rules,
/// so a `ScopeTarget` is always complete.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeTarget {
    Global,
    Org(String),
    User(String),
    Repo { owner: String, name: String },
}

impl ScopeTarget {
    /// Scope this target was built from.
    pub fn scope(&self) -> PoolScope {
        match self {
            ScopeTarget::Global => PoolScope::Global,
            ScopeTarget::Org(_) => PoolScope::Org,
            ScopeTarget::User(_) => PoolScope::User,
            ScopeTarget::Repo { .. } => PoolScope::Repo,
        }
    }
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeTarget::Global => f.write_str("global"),
            ScopeTarget::Org(org) => write!(f, "org/{org}"),
            ScopeTarget::User(user) => write!(f, "user/{user}"),
            ScopeTarget::Repo { owner, name } => write!(f, "repo/{owner}/{name}"),
        }
    }
}
