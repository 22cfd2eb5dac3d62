//! Step outcomes and the records a run produces.

use serde::{Deserialize, Serialize};

use crate::domain::version::ReleaseVersion;
use crate::host::PullRequestState;

/// Non-fatal result of a per-repository step.
///
/// Fatal failures never appear here; they are returned as
/// [`ReleaseError`](super::error::ReleaseError). The orchestrator decides
/// what to record purely by matching on this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step completed. Pull request steps carry the PR URL when one was
    /// created or recovered.
    Success { url: Option<String> },
    /// The automated merge conflicted. `url` is the reconciliation pull
    /// request opened (or recovered) instead; when none could be opened,
    /// `error` says why.
    RecoverableConflict {
        url: Option<String>,
        error: Option<String>,
    },
    /// The host rejected a pull request payload. `url` is set when an
    /// equivalent open pull request could be recovered.
    ValidationRejected { message: String, url: Option<String> },
}

impl StepOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            StepOutcome::Success { url }
            | StepOutcome::ValidationRejected { url, .. }
            | StepOutcome::RecoverableConflict { url, .. } => url.as_deref(),
        }
    }
}

/// One record per repository processed by a release-creation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOutcome {
    pub repository: String,
    /// Release pull request toward the production branch.
    pub pr_url: Option<String>,
    /// Message the host returned when it rejected the release pull request.
    pub pr_error: Option<String>,
    /// Reconciliation pull request opened after a merge conflict.
    pub conflict_pr_url: Option<String>,
    /// Why no reconciliation pull request could be opened after a conflict.
    pub conflict_error: Option<String>,
}

impl RepositoryOutcome {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    /// True when the development merge conflicted, whether or not a
    /// reconciliation pull request exists.
    pub fn has_conflict(&self) -> bool {
        self.conflict_pr_url.is_some() || self.conflict_error.is_some()
    }

    /// `<repo>:<url>:<error>`, empty segments for missing values.
    pub fn detail_line(&self) -> String {
        format!(
            "{}:{}:{}",
            self.repository,
            self.pr_url.as_deref().unwrap_or_default(),
            self.pr_error.as_deref().unwrap_or_default()
        )
    }
}

/// An open pull request from the current release branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenReleasePr {
    pub url: String,
    pub id: u64,
    pub number: u64,
    pub repository: String,
    pub state: PullRequestState,
}

/// One triggered production workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub repository: String,
    pub workflow_id: u64,
    pub workflow_name: String,
    pub workflow_path: String,
}

/// What a completed run reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Release-creation run: one outcome per repository, in input order.
    Created {
        version: ReleaseVersion,
        outcomes: Vec<RepositoryOutcome>,
    },
    /// Production run stopped by the pre-release gate.
    Blocked {
        version: ReleaseVersion,
        open_prs: Vec<OpenReleasePr>,
    },
    /// Production run that dispatched its workflows.
    Dispatched {
        version: ReleaseVersion,
        environment: String,
        dispatches: Vec<DispatchRecord>,
    },
}

impl RunReport {
    pub fn version(&self) -> &ReleaseVersion {
        match self {
            RunReport::Created { version, .. }
            | RunReport::Blocked { version, .. }
            | RunReport::Dispatched { version, .. } => version,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RunReport::Blocked { .. })
    }

    /// Newline-joined per-repository detail lines.
    pub fn details(&self) -> String {
        match self {
            RunReport::Created { outcomes, .. } => outcomes
                .iter()
                .map(RepositoryOutcome::detail_line)
                .collect::<Vec<_>>()
                .join("\n"),
            RunReport::Blocked { open_prs, .. } => open_prs
                .iter()
                .map(|pr| format!("{}:{}:{}", pr.repository, pr.url, pr.state))
                .collect::<Vec<_>>()
                .join("\n"),
            RunReport::Dispatched { dispatches, .. } => dispatches
                .iter()
                .map(|d| format!("{}:{}:{}", d.repository, d.workflow_name, d.workflow_path))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
