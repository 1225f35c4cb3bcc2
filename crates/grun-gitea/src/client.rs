//! Gitea REST API v1 client.
//!
//! Uses reqwest to page through the Actions job endpoints of a pool's scope.

use std::time::Duration;

use async_trait::async_trait;
use grun_core::{
    capability::{Capabilities, CapabilityMatcher},
    queue::{JobSource, QueueError, QueueQuery},
};
use grun_model::{PendingStatus, QueuedJob, ScopeTarget};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, trace};

use crate::types::{JobsResponse, Repository};

/// Items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest `limit` a stock Gitea honors (`MAX_RESPONSE_ITEMS`).
pub const MAX_PAGE_SIZE: u32 = 50;

/// Timeout for every single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const OP_FETCH_JOBS: &str = "fetch queued jobs";
const OP_LIST_REPOS: &str = "list user repositories";

/// Longest error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 1024;

const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Gitea client construction errors.
#[derive(Debug, Error)]
pub enum GiteaError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Settings shared by all pools polled through one client.
#[derive(Debug, Clone)]
pub struct GiteaConfig {
    /// `limit` query parameter, at most [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Honor `HTTP(S)_PROXY` / `NO_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for GiteaConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            use_system_proxy: true,
        }
    }
}

/// Queue-stats client for Gitea Actions.
///
/// Tokens and base URLs come with every [`QueueQuery`], so one client serves any number of pools.
#[derive(Debug, Clone)]
pub struct GiteaClient {
    http: reqwest::Client,
    page_size: u32,
    matcher: CapabilityMatcher,
}

impl GiteaClient {
    /// Create a new client with the default capability matcher.
    pub fn new(config: &GiteaConfig) -> Result<Self, GiteaError> {
        if config.page_size == 0 {
            return Err(GiteaError::Config("page_size must be > 0".into()));
        }
        if config.page_size > MAX_PAGE_SIZE {
            return Err(GiteaError::Config(format!(
                "page_size must be <= {MAX_PAGE_SIZE}, got {}",
                config.page_size
            )));
        }
        if config.request_timeout.is_zero() {
            return Err(GiteaError::Config("request_timeout must be > 0".into()));
        }

        // reqwest is built with `rustls-no-provider`; `Err` only means a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            http: builder.build()?,
            page_size: config.page_size,
            matcher: CapabilityMatcher::default(),
        })
    }

    /// Replace the capability matcher used to filter fetched pages.
    pub fn with_matcher(mut self, matcher: CapabilityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Build the API v1 URL for a given path.
    pub(crate) fn api_url(base_url: &str, path: &str) -> String {
        format!("{}/api/v1{}", base_url.trim().trim_end_matches('/'), path)
    }

    /// Job endpoint of a scope that maps onto a single endpoint.
    ///
    /// `user` scope has none: it is expanded into the repositories of the user.
    pub(crate) fn jobs_path(target: &ScopeTarget) -> Option<String> {
        match target {
            ScopeTarget::Global => Some("/admin/actions/jobs".to_string()),
            ScopeTarget::Org(org) => Some(format!("/orgs/{org}/actions/jobs")),
            ScopeTarget::Repo { owner, name } => Some(format!("/repos/{owner}/{name}/actions/jobs")),
            ScopeTarget::User(_) => None,
        }
    }

    /// GET `url` and decode the body, mapping non-success statuses to [`QueueError`].
    ///
    /// Also returns the `X-Total-Count` header when the server sends one.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        operation: &'static str,
    ) -> Result<(T, Option<usize>), QueueError> {
        let auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| QueueError::InvalidQuery("token contains invalid header characters".into()))?;

        trace!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| QueueError::Transport {
                operation,
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            debug!(%url, status = status.as_u16(), "queue service rejected request");
            return Err(QueueError::from_status(status.as_u16(), body, operation));
        }

        let total = resp
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let bytes = resp.bytes().await.map_err(|e| QueueError::Transport {
            operation,
            reason: e.to_string(),
        })?;
        let body = serde_json::from_slice(&bytes).map_err(|e| QueueError::Decode {
            operation,
            reason: e.to_string(),
        })?;
        Ok((body, total))
    }

    /// Collect matching jobs of one endpoint for every pending category.
    ///
    /// Categories are fetched one after another, pages sequentially from 1.
    async fn fetch_endpoint(
        &self,
        endpoint: &str,
        token: &str,
        capabilities: &Capabilities,
        out: &mut Vec<QueuedJob>,
    ) -> Result<(), QueueError> {
        let limit = self.page_size as usize;
        for status in PendingStatus::ALL {
            let mut page = 1u32;
            let mut seen = 0usize;
            loop {
                let url = format!("{endpoint}?status={status}&page={page}&limit={}", self.page_size);
                let (resp, header_total) = self
                    .get_json::<JobsResponse>(&url, token, OP_FETCH_JOBS)
                    .await?;
                let total = resp.total().or(header_total);
                let mut jobs = resp.into_jobs();
                let received = jobs.len();
                seen += received;

                self.matcher.retain_matching(&mut jobs, capabilities);
                trace!(%endpoint, %status, page, received, ?total, matched = jobs.len(), "jobs page");
                out.extend(jobs);

                if !has_more_pages(seen, received, limit, total) {
                    if total.is_some_and(|t| seen < t) {
                        debug!(%endpoint, %status, seen, ?total, "queue shrank while paging");
                    }
                    break;
                }
                page += 1;
            }
        }
        Ok(())
    }

    /// Enumerate all repositories owned by `user`.
    async fn list_user_repos(&self, base_url: &str, token: &str, user: &str) -> Result<Vec<Repository>, QueueError> {
        let endpoint = Self::api_url(base_url, &format!("/users/{user}/repos"));
        let limit = self.page_size as usize;
        let mut repos = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!("{endpoint}?page={page}&limit={}", self.page_size);
            let (batch, total): (Vec<Repository>, _) = self.get_json(&url, token, OP_LIST_REPOS).await?;
            let received = batch.len();
            repos.extend(batch);

            if !has_more_pages(repos.len(), received, limit, total) {
                break;
            }
            page += 1;
        }
        debug!(user, repos = repos.len(), "user repositories listed");
        Ok(repos)
    }
}

/// Whether pagination must request another page.
///
/// A known total wins over page length: servers may cap `limit` below the requested size,
/// so a short page alone does not mean the listing is exhausted.
pub(crate) fn has_more_pages(seen: usize, received: usize, limit: usize, total: Option<usize>) -> bool {
    if received == 0 {
        return false;
    }
    match total {
        Some(total) => seen < total,
        None => received >= limit,
    }
}

#[async_trait]
impl JobSource for GiteaClient {
    fn name(&self) -> &'static str {
        "gitea"
    }

    async fn fetch_queued(&self, query: &QueueQuery) -> Result<Vec<QueuedJob>, QueueError> {
        if query.base_url.trim().is_empty() {
            return Err(QueueError::InvalidQuery("base url is empty".into()));
        }
        let mut out = Vec::new();

        match &query.target {
            ScopeTarget::User(user) => {
                let repos = self.list_user_repos(&query.base_url, &query.token, user).await?;
                for repo in repos {
                    let path = format!("/repos/{}/{}/actions/jobs", repo.owner.login, repo.name);
                    let endpoint = Self::api_url(&query.base_url, &path);
                    self.fetch_endpoint(&endpoint, &query.token, &query.capabilities, &mut out)
                        .await?;
                }
            }
            target => {
                // Every other scope maps onto exactly one endpoint.
                let path = Self::jobs_path(target)
                    .ok_or_else(|| QueueError::InvalidQuery(format!("no job endpoint for {target}")))?;
                let endpoint = Self::api_url(&query.base_url, &path);
                self.fetch_endpoint(&endpoint, &query.token, &query.capabilities, &mut out)
                    .await?;
            }
        }

        debug!(target = %query.target, matched = out.len(), "queued jobs collected");
        Ok(out)
    }
}
