//! Engine error taxonomy.
//!
//! Every variant here aborts the run. Non-fatal conditions (merge conflicts,
//! pull request validation rejections) never become a `ReleaseError`; they
//! travel as [`StepOutcome`](super::outcome::StepOutcome) variants instead.

use crate::domain::outcome::OpenReleasePr;
use crate::host::HostError;

/// The per-repository step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    ResolveBaseBranch,
    LookupReleaseBranch,
    CreateReleaseBranch,
    Merge,
    CreatePullRequest,
    RecoverPullRequest,
    ListPullRequests,
    ListWorkflows,
    DispatchWorkflow,
    RepositoryDispatch,
}

impl std::fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReleaseStep::ResolveBaseBranch => "resolving base branch",
            ReleaseStep::LookupReleaseBranch => "looking up release branch",
            ReleaseStep::CreateReleaseBranch => "creating release branch",
            ReleaseStep::Merge => "merging development branch",
            ReleaseStep::CreatePullRequest => "creating pull request",
            ReleaseStep::RecoverPullRequest => "recovering existing pull request",
            ReleaseStep::ListPullRequests => "listing pull requests",
            ReleaseStep::ListWorkflows => "listing workflows",
            ReleaseStep::DispatchWorkflow => "dispatching workflow",
            ReleaseStep::RepositoryDispatch => "sending repository dispatch",
        };
        f.write_str(s)
    }
}

/// Run-aborting errors.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("invalid release version '{0}': expected v<major>.<minor>.<patch>")]
    InvalidVersion(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("repository {repo} could not be resolved: {source}")]
    RepositoryUnavailable {
        repo: String,
        #[source]
        source: HostError,
    },

    #[error("listing repositories for {owner} failed: {source}")]
    RepositoryListing {
        owner: String,
        #[source]
        source: HostError,
    },

    #[error("error {step} for repo {repo}: {source}")]
    Step {
        repo: String,
        step: ReleaseStep,
        #[source]
        source: HostError,
    },

    #[error("invalid workflow filter '{pattern}': {source}")]
    InvalidWorkflowFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "release blocked: {} release pull request(s) still open: {}",
        .open_prs.len(),
        summarize(.open_prs)
    )]
    ReleaseBlocked { open_prs: Vec<OpenReleasePr> },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReleaseError {
    pub fn step(repo: &str, step: ReleaseStep, source: HostError) -> Self {
        ReleaseError::Step {
            repo: repo.to_string(),
            step,
            source,
        }
    }

    /// Repository the failure is attributed to, when there is one.
    pub fn repository(&self) -> Option<&str> {
        match self {
            ReleaseError::RepositoryUnavailable { repo, .. }
            | ReleaseError::Step { repo, .. } => Some(repo),
            _ => None,
        }
    }
}

fn summarize(open_prs: &[OpenReleasePr]) -> String {
    open_prs
        .iter()
        .map(|pr| format!("{} ({})", pr.repository, pr.url))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PullRequestState;

    #[test]
    fn test_step_error_names_repo_and_step() {
        let err = ReleaseError::step(
            "billing",
            ReleaseStep::ResolveBaseBranch,
            HostError::NotFound("Not Found".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("billing"));
        assert!(msg.contains("resolving base branch"));
        assert_eq!(err.repository(), Some("billing"));
    }

    #[test]
    fn test_release_blocked_lists_every_pr() {
        let err = ReleaseError::ReleaseBlocked {
            open_prs: vec![
                OpenReleasePr {
                    url: "https://github.com/acme/a/pull/1".to_string(),
                    id: 11,
                    number: 1,
                    repository: "a".to_string(),
                    state: PullRequestState::Open,
                },
                OpenReleasePr {
                    url: "https://github.com/acme/b/pull/7".to_string(),
                    id: 17,
                    number: 7,
                    repository: "b".to_string(),
                    state: PullRequestState::Open,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 release pull request(s)"));
        assert!(msg.contains("acme/a/pull/1"));
        assert!(msg.contains("acme/b/pull/7"));
        assert!(err.repository().is_none());
    }

    #[test]
    fn test_invalid_version_display() {
        let err = ReleaseError::InvalidVersion("1.2.3".to_string());
        assert!(err.to_string().contains("v<major>.<minor>.<patch>"));
    }
}
