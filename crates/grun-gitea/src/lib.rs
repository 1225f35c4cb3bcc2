//! Gitea Actions integration.
//!
//! Provides a reqwest-based [`JobSource`](grun_core::queue::JobSource) that collects
//! pending jobs over the Gitea REST API v1, resolving pool scopes into job endpoints.

mod client;
pub mod types;


pub use client::{DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT, GiteaClient, GiteaConfig, GiteaError, MAX_PAGE_SIZE};
pub use types::{JobsResponse, Repository, RepositoryOwner};
