//! Pull request creation with validation handling and URL recovery.

use std::sync::Arc;

use crate::domain::error::{ReleaseError, ReleaseStep, Result};
use crate::domain::StepOutcome;
use crate::host::{HostError, NewPullRequest, PullRequestFilter, RepoHost};
use crate::obs;

/// Creates a pull request, or recovers the URL of the equivalent open one.
///
/// Re-running with the same `(repo, from, to)` converges on a single pull
/// request: the host rejects the duplicate with a validation error and the
/// existing URL is recovered by listing.
#[derive(Clone)]
pub struct PullRequestReconciler {
    host: Arc<dyn RepoHost>,
}

impl PullRequestReconciler {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self { host }
    }

    /// Open a pull request from `from` into `to`.
    ///
    /// * created → `Success { url }`
    /// * 422 → `ValidationRejected { message, url }` where `url` is the
    ///   recovered open pull request, if any
    /// * anything else → `Err`
    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        from: &str,
        to: &str,
        title: &str,
        body: &str,
    ) -> Result<StepOutcome> {
        let request = NewPullRequest {
            title: title.to_string(),
            body: body.to_string(),
            head: from.to_string(),
            base: to.to_string(),
        };

        let (created_url, rejection) =
            match self.host.create_pull_request(owner, repo, &request).await {
                Ok(pr) => {
                    if !pr.html_url.is_empty() {
                        obs::emit_pr_created(repo, &pr.html_url);
                    }
                    (Some(pr.html_url).filter(|u| !u.is_empty()), None)
                }
                Err(e @ HostError::Validation { .. }) => {
                    let message = e.validation_message().unwrap_or_default().to_string();
                    obs::emit_pr_rejected(repo, &message);
                    (None, Some(message))
                }
                Err(e) => return Err(ReleaseError::step(repo, ReleaseStep::CreatePullRequest, e)),
            };

        let url = match created_url {
            Some(url) => Some(url),
            None => self.recover_open_pull_request(owner, repo, from, to).await?,
        };

        Ok(match rejection {
            Some(message) => StepOutcome::ValidationRejected { message, url },
            None => StepOutcome::Success { url },
        })
    }

    async fn recover_open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        from: &str,
        to: &str,
    ) -> Result<Option<String>> {
        let open = self
            .host
            .list_pull_requests(owner, repo, &PullRequestFilter::open_between(owner, from, to))
            .await
            .map_err(|e| ReleaseError::step(repo, ReleaseStep::RecoverPullRequest, e))?;

        let url = open
            .into_iter()
            .map(|pr| pr.html_url)
            .find(|u| !u.is_empty());
        if let Some(u) = &url {
            obs::emit_pr_recovered(repo, u);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{HostOperation, MemoryRepoHost};
    use crate::host::PullRequestState;

    const OWNER: &str = "acme";

    fn host_with_release_branch() -> Arc<MemoryRepoHost> {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["main", "rc/v1.0.0"]);
        host
    }

    async fn reconcile(host: &Arc<MemoryRepoHost>) -> Result<StepOutcome> {
        PullRequestReconciler::new(host.clone())
            .create_pull_request(OWNER, "api", "rc/v1.0.0", "main", "Release", "Release")
            .await
    }

    #[tokio::test]
    async fn test_creates_pull_request() {
        let host = host_with_release_branch();
        let outcome = reconcile(&host).await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Success {
                url: Some("https://github.com/acme/api/pull/1".to_string())
            }
        );
        assert_eq!(host.count(HostOperation::ListPullRequests), 0);
    }

    #[tokio::test]
    async fn test_empty_url_is_recovered_by_listing() {
        let host = host_with_release_branch();
        host.suppress_pull_request_urls();

        let outcome = reconcile(&host).await.unwrap();
        assert_eq!(
            outcome.url(),
            Some("https://github.com/acme/api/pull/1")
        );
        assert_eq!(host.count(HostOperation::ListPullRequests), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_converge_on_same_url() {
        let host = host_with_release_branch();

        let first = reconcile(&host).await.unwrap();
        let second = reconcile(&host).await.unwrap();

        assert_eq!(first.url(), second.url());
        assert!(matches!(
            second,
            StepOutcome::ValidationRejected { ref message, .. }
                if message.starts_with("A pull request already exists")
        ));
        assert_eq!(host.pull_requests("api").len(), 1);
    }

    #[tokio::test]
    async fn test_recovery_ignores_pull_requests_into_other_bases() {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["main", "staging", "rc/v1.0.0"]);
        host.add_pull_request("api", "rc/v1.0.0", "staging", PullRequestState::Open);
        host.fail(
            HostOperation::CreatePullRequest,
            "api",
            HostError::Validation {
                message: "Validation Failed".to_string(),
                errors: vec!["No commits between main and rc/v1.0.0".to_string()],
            },
        );

        let outcome = reconcile(&host).await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::ValidationRejected {
                message: "No commits between main and rc/v1.0.0".to_string(),
                url: None,
            }
        );
    }

    #[tokio::test]
    async fn test_non_validation_failure_is_fatal() {
        let host = host_with_release_branch();
        host.fail(
            HostOperation::CreatePullRequest,
            "api",
            HostError::Api {
                status: 500,
                message: "Server Error".to_string(),
            },
        );
        let err = reconcile(&host).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Step {
                step: ReleaseStep::CreatePullRequest,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_recovery_listing_failure_is_fatal() {
        let host = host_with_release_branch();
        host.suppress_pull_request_urls();
        host.fail(
            HostOperation::ListPullRequests,
            "api",
            HostError::Transport("connection reset".to_string()),
        );
        let err = reconcile(&host).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Step {
                step: ReleaseStep::RecoverPullRequest,
                ..
            }
        ));
    }
}
