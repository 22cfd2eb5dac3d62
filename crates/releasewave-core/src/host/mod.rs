//! Repository host capability set.
//!
//! [`RepoHost`] is the seam between the release engine and the remote
//! hosting API. The engine never talks HTTP: it calls these operations and
//! matches on [`HostError`] variants. The GitHub adapter lives in the
//! `releasewave-github` crate; an in-memory fake lives in [`crate::fakes`].

pub mod error;

pub use error::{HostError, HostResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Host records
// ---------------------------------------------------------------------------

/// A repository as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

/// A branch ref and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Fully qualified ref, e.g. `refs/heads/rc/v1.2.3`.
    pub name: String,
    pub sha: String,
}

/// Result of a host-side branch merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// A merge commit was created on the base branch.
    Merged { sha: String },
    /// The base branch already contains the head branch.
    NothingToMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Source branch.
    pub head: String,
    /// Target branch.
    pub base: String,
}

/// A pull request as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    /// Browser URL. May be empty when the host omits it.
    pub html_url: String,
    pub state: PullRequestState,
    pub head_ref: String,
    pub base_ref: String,
}

/// Query for [`RepoHost::list_pull_requests`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    /// Owner-qualified source branch, `owner:branch`.
    pub head: Option<String>,
    pub base: Option<String>,
    /// `None` lists every state.
    pub state: Option<PullRequestState>,
}

impl PullRequestFilter {
    /// Open pull requests from `owner:head` into `base`.
    pub fn open_between(owner: &str, head: &str, base: &str) -> Self {
        Self {
            head: Some(format!("{}:{}", owner, head)),
            base: Some(base.to_string()),
            state: Some(PullRequestState::Open),
        }
    }
}

/// A workflow definition in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub url: String,
    /// Path of the definition file, e.g. `.github/workflows/prod-release.yml`.
    pub path: String,
    pub repository: String,
}

// ---------------------------------------------------------------------------
// RepoHost
// ---------------------------------------------------------------------------

/// Operations the release engine needs from a repository host.
///
/// All methods address a repository as `(owner, repo)`. Implementations
/// map transport-level failures onto [`HostError`]; in particular a merge
/// conflict must surface as [`HostError::Conflict`] and a rejected payload
/// as [`HostError::Validation`].
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Fetch a single repository by name.
    async fn get_repository(&self, owner: &str, repo: &str) -> HostResult<Repository>;

    /// List every repository of an organization, following pagination.
    async fn list_org_repositories(&self, owner: &str) -> HostResult<Vec<Repository>>;

    /// Resolve a branch to its tip commit. Absent branches yield
    /// [`HostError::NotFound`].
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> HostResult<GitRef>;

    /// Create `branch` pointing at `sha`.
    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> HostResult<GitRef>;

    /// Merge `head` into `base` on the host.
    async fn merge_branches(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> HostResult<MergeResult>;

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> HostResult<PullRequest>;

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullRequestFilter,
    ) -> HostResult<Vec<PullRequest>>;

    async fn list_workflows(&self, owner: &str, repo: &str) -> HostResult<Vec<Workflow>>;

    /// Trigger a `workflow_dispatch` run of `workflow_id` on `git_ref`.
    async fn create_workflow_dispatch(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
        git_ref: &str,
        inputs: &Map<String, Value>,
    ) -> HostResult<()>;

    /// Send a `repository_dispatch` event.
    async fn create_repository_dispatch(
        &self,
        owner: &str,
        repo: &str,
        event_type: &str,
        client_payload: &Value,
    ) -> HostResult<()>;
}
