use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    domain::{PoolName, SecretRef},
    error::{ModelError, ModelResult},
    spec::{PoolSchedule, PoolScope, ScopeTarget},
};

/// Declarative description of a runner pool.
///
/// `PoolSpec` describes *where* queued jobs are looked up and *how many* ephemeral runners may serve them.
///
/// Fields cover:
/// - query breadth (`scope` with its `org` / `user` / `repo` qualifiers, `gitea_url`)
/// - offered capabilities (`labels`)
/// - capacity (`max_active_runners`)
/// - credentials (`auth_token`, `registration_token`)
/// - reconciliation cadence (`schedule`)
///
/// The spec is read-only for the scaling engine; it is re-read on every pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    /// Unique pool name.
    pub name: PoolName,
    /// Breadth of the queue query.
    pub scope: PoolScope,
    /// Organization; required for `org`, possible owner for `repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// User; required for `user`, possible owner for `repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Repository name; required for `repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Base URL of the queue-service instance (e.g. `https://gitea.example.com`).
    pub gitea_url: String,
    /// Labels declared for runners of this pool.
    ///
    /// Merged with the default labels into the effective capabilities on every pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Upper bound for concurrently alive runners of this pool.
    pub max_active_runners: usize,
    /// Token used to poll the queue service.
    pub auth_token: SecretRef,
    /// Token handed to every launched runner for registration.
    pub registration_token: SecretRef,
    /// Reconciliation cadence.
    #[serde(default)]
    pub schedule: PoolSchedule,
}

impl PoolSpec {
    /// Validate the whole spec.
    ///
    /// Rules:
    /// - `name` and `gitea_url` are not empty, `gitea_url` is an http(s) URL;
    /// - `max_active_runners >= 1`;
    /// - scope qualifiers follow the rules of [`PoolSpec::target`];
    /// - secret references and schedule are valid.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid("pool name is empty".into()));
        }
        let url = self.gitea_url.trim();
        if url.is_empty() {
            return Err(ModelError::Invalid(format!(
                "pool '{}': giteaUrl is empty",
                self.name
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ModelError::Invalid(format!(
                "pool '{}': giteaUrl must start with http:// or https://",
                self.name
            )));
        }
        if self.max_active_runners == 0 {
            return Err(ModelError::Invalid(format!(
                "pool '{}': maxActiveRunners must be >= 1",
                self.name
            )));
        }
        self.target()?;
        self.auth_token.validate()?;
        self.registration_token.validate()?;
        self.schedule.validate()
    }

    /// Resolve scope and qualifiers into a query target.
    ///
    /// | scope    | required              | forbidden          |
    /// |----------|-----------------------|--------------------|
    /// | `global` | –                     | org, user, repo    |
    /// | `org`    | org                   | user, repo         |
    /// | `user`   | user                  | org, repo          |
    /// | `repo`   | repo + (org xor user) | –                  |
    ///
    /// Blank strings count as absent.
    pub fn target(&self) -> ModelResult<ScopeTarget> {
        let org = present(&self.org);
        let user = present(&self.user);
        let repo = present(&self.repo);
        let scope = self.scope.as_str();

        match self.scope {
            PoolScope::Global => {
                self.forbid(scope, "org", org)?;
                self.forbid(scope, "user", user)?;
                self.forbid(scope, "repo", repo)?;
                Ok(ScopeTarget::Global)
            }
            PoolScope::Org => {
                self.forbid(scope, "user", user)?;
                self.forbid(scope, "repo", repo)?;
                let org = self.require(scope, "org", org)?;
                Ok(ScopeTarget::Org(org.to_string()))
            }
            PoolScope::User => {
                self.forbid(scope, "org", org)?;
                self.forbid(scope, "repo", repo)?;
                let user = self.require(scope, "user", user)?;
                Ok(ScopeTarget::User(user.to_string()))
            }
            PoolScope::Repo => {
                let name = self.require(scope, "repo", repo)?;
                let owner = match (org, user) {
                    (Some(owner), None) | (None, Some(owner)) => owner,
                    (None, None) => {
                        return Err(ModelError::MissingQualifier {
                            pool: self.name.clone(),
                            scope,
                            field: "org",
                        });
                    }
                    (Some(_), Some(_)) => {
                        return Err(ModelError::AmbiguousOwner {
                            pool: self.name.clone(),
                        });
                    }
                };
                Ok(ScopeTarget::Repo {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    fn require<'a>(
        &self,
        scope: &'static str,
        field: &'static str,
        value: Option<&'a str>,
    ) -> ModelResult<&'a str> {
        value.ok_or_else(|| ModelError::MissingQualifier {
            pool: self.name.clone(),
            scope,
            field,
        })
    }

    fn forbid(&self, scope: &'static str, field: &'static str, value: Option<&str>) -> ModelResult<()> {
        match value {
            Some(_) => Err(ModelError::ForbiddenQualifier {
                pool: self.name.clone(),
                scope,
                field,
            }),
            None => Ok(()),
        }
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
