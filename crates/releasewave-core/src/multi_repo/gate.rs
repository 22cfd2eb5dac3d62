//! Pre-release gate: no release pull request may still be open.
//!
//! Before production workflows are dispatched, every selected repository is
//! checked for an open pull request from the release branch into the
//! production branch. Any such PR means the release candidate has not been
//! merged everywhere yet and the production run is blocked.

use std::sync::Arc;

use crate::domain::error::{ReleaseError, ReleaseStep, Result};
use crate::domain::OpenReleasePr;
use crate::host::{PullRequestFilter, RepoHost};
use crate::obs;

/// Verdict of the pre-release gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Clear,
    Blocked(Vec<OpenReleasePr>),
}

impl GateVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateVerdict::Blocked(_))
    }

    pub fn open_prs(&self) -> &[OpenReleasePr] {
        match self {
            GateVerdict::Clear => &[],
            GateVerdict::Blocked(prs) => prs,
        }
    }

    /// Convert into a `Result`, treating a blocked gate as an error.
    pub fn into_result(self) -> Result<()> {
        match self {
            GateVerdict::Clear => Ok(()),
            GateVerdict::Blocked(open_prs) => Err(ReleaseError::ReleaseBlocked { open_prs }),
        }
    }
}

pub struct PreReleaseGate {
    host: Arc<dyn RepoHost>,
}

impl PreReleaseGate {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self { host }
    }

    /// Collect open release pull requests across `repos`.
    ///
    /// The host's head filter is not trusted on its own: only pull requests
    /// whose head ref equals `release_branch` exactly are kept.
    pub async fn check_open_release_prs(
        &self,
        owner: &str,
        repos: &[String],
        release_branch: &str,
        production_branch: &str,
    ) -> Result<GateVerdict> {
        let filter = PullRequestFilter::open_between(owner, release_branch, production_branch);
        let mut open_prs = Vec::new();

        for repo in repos {
            let pulls = self
                .host
                .list_pull_requests(owner, repo, &filter)
                .await
                .map_err(|e| ReleaseError::step(repo, ReleaseStep::ListPullRequests, e))?;

            open_prs.extend(
                pulls
                    .into_iter()
                    .filter(|pr| pr.head_ref == release_branch)
                    .map(|pr| OpenReleasePr {
                        url: pr.html_url,
                        id: pr.id,
                        number: pr.number,
                        repository: repo.clone(),
                        state: pr.state,
                    }),
            );
        }

        obs::emit_gate_evaluated(repos.len(), open_prs.len());
        if open_prs.is_empty() {
            Ok(GateVerdict::Clear)
        } else {
            Ok(GateVerdict::Blocked(open_prs))
        }
    }
}
