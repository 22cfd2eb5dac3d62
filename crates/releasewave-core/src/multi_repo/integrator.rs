//! Development-branch integration with a pull request fallback on conflict.

use std::sync::Arc;

use crate::domain::error::{ReleaseError, ReleaseStep, Result};
use crate::domain::{ReleaseVersion, StepOutcome};
use crate::host::{HostError, MergeResult, RepoHost};
use crate::multi_repo::reconciler::PullRequestReconciler;
use crate::obs;

/// Merges the development branch into the release branch on the host.
///
/// A conflicting merge is not an error: a reconciliation pull request from
/// the development branch into the release branch is opened instead, and the
/// result is reported as [`StepOutcome::RecoverableConflict`]. When the host
/// refuses that pull request too, the refusal is carried in the outcome and
/// the batch goes on.
pub struct ConflictAwareIntegrator {
    host: Arc<dyn RepoHost>,
    reconciler: PullRequestReconciler,
}

impl ConflictAwareIntegrator {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self {
            reconciler: PullRequestReconciler::new(host.clone()),
            host,
        }
    }

    pub async fn integrate(
        &self,
        owner: &str,
        repo: &str,
        development_branch: &str,
        release_branch: &str,
        version: &ReleaseVersion,
    ) -> Result<StepOutcome> {
        let message = merge_commit_message(development_branch, release_branch, repo);

        match self
            .host
            .merge_branches(owner, repo, release_branch, development_branch, &message)
            .await
        {
            Ok(result) => {
                obs::emit_merge_completed(
                    repo,
                    development_branch,
                    release_branch,
                    matches!(result, MergeResult::Merged { .. }),
                );
                Ok(StepOutcome::Success { url: None })
            }
            Err(HostError::Conflict(_)) => {
                obs::emit_merge_conflict(repo, development_branch, release_branch);
                self.open_conflict_pull_request(
                    owner,
                    repo,
                    development_branch,
                    release_branch,
                    version,
                )
                .await
            }
            Err(e) => Err(ReleaseError::step(repo, ReleaseStep::Merge, e)),
        }
    }

    async fn open_conflict_pull_request(
        &self,
        owner: &str,
        repo: &str,
        development_branch: &str,
        release_branch: &str,
        version: &ReleaseVersion,
    ) -> Result<StepOutcome> {
        let title = format!("Merge conflict to {}", version);
        let outcome = self
            .reconciler
            .create_pull_request(
                owner,
                repo,
                development_branch,
                release_branch,
                &title,
                &title,
            )
            .await?;

        let (url, error) = match outcome {
            StepOutcome::Success { url: Some(url) } => (Some(url), None),
            StepOutcome::Success { url: None } => {
                (None, Some("host returned no pull request URL".to_string()))
            }
            StepOutcome::ValidationRejected { message, url } => {
                let error = url.is_none().then_some(message);
                (url, error)
            }
            StepOutcome::RecoverableConflict { url, error } => (url, error),
        };
        if url.is_none() {
            tracing::warn!(
                repo = %repo,
                error = error.as_deref().unwrap_or_default(),
                "no reconciliation pull request for merge conflict"
            );
        }
        Ok(StepOutcome::RecoverableConflict { url, error })
    }
}

fn merge_commit_message(development_branch: &str, release_branch: &str, repo: &str) -> String {
    format!(
        "Merge branch '{}' into '{}' on {}",
        development_branch, release_branch, repo
    )
}
