//! GitHub adapter for ReleaseWave
//!
//! Implements [`releasewave_core::RepoHost`] over the GitHub REST API:
//! - Repository lookup and paginated organization listing
//! - Branch refs, server-side merges and pull requests
//! - Workflow listing, `workflow_dispatch` and `repository_dispatch`
//! - GitHub App installation tokens (RS256 JWT exchange)
//!
//! HTTP statuses are mapped onto [`releasewave_core::HostError`] so the
//! engine can tell "not found", "conflict" and "validation failed" apart.

pub mod app_auth;
pub mod client;
pub mod error;
mod models;

pub use app_auth::{AppAuthenticator, AppCredentials};
pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;

/// Result type for adapter construction
pub type Result<T> = std::result::Result<T, GitHubError>;
