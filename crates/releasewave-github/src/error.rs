//! Error types for releasewave-github

use thiserror::Error;

/// Errors raised while constructing a [`GitHubClient`](crate::GitHubClient)
/// or obtaining its installation token.
///
/// Failures of individual API calls are reported as
/// [`releasewave_core::HostError`] instead.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// The API base URL could not be parsed
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The token contains bytes that are not valid in an HTTP header
    #[error("GitHub token is not a valid header value")]
    InvalidToken,

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(String),

    /// The GitHub App private key is not a usable RSA PEM key
    #[error("invalid GitHub App private key: {0}")]
    InvalidPrivateKey(String),

    /// Signing the GitHub App JWT failed
    #[error("failed to sign GitHub App JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// GitHub refused to issue an installation token
    #[error("installation token exchange failed: {0}")]
    TokenExchange(#[source] releasewave_core::HostError),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}
