//! In-memory fake for the repository host (testing only)
//!
//! `MemoryRepoHost` models just enough of a hosting API to drive the engine:
//! branches with commit ancestry, merges that can be forced to conflict,
//! pull requests with the host's duplicate and "no commits" rejections,
//! workflows, and dispatch events. Every call is recorded so tests can
//! assert on sequencing, and any operation can be made to fail per
//! repository.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::host::{
    GitRef, HostError, HostResult, MergeResult, NewPullRequest, PullRequest, PullRequestFilter,
    PullRequestState, RepoHost, Repository, Workflow,
};

/// Host operations, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    GetRepository,
    ListOrgRepositories,
    GetBranch,
    CreateBranch,
    MergeBranches,
    CreatePullRequest,
    ListPullRequests,
    ListWorkflows,
    CreateWorkflowDispatch,
    CreateRepositoryDispatch,
}

/// One recorded host call. `repo` is the owner for organization listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCall {
    pub operation: HostOperation,
    pub repo: String,
}

/// A dispatch event received by the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedDispatch {
    Workflow {
        repo: String,
        workflow_id: u64,
        git_ref: String,
        inputs: Map<String, Value>,
    },
    Repository {
        repo: String,
        event_type: String,
        client_payload: Value,
    },
}

#[derive(Debug, Clone, Default)]
struct FakeBranch {
    sha: String,
    /// Every commit reachable from `sha`, excluding `sha` itself.
    ancestors: BTreeSet<String>,
}

impl FakeBranch {
    fn contains(&self, sha: &str) -> bool {
        self.sha == sha || self.ancestors.contains(sha)
    }
}

#[derive(Debug, Default)]
struct FakeRepo {
    archived: bool,
    branches: BTreeMap<String, FakeBranch>,
    pulls: Vec<PullRequest>,
    workflows: Vec<Workflow>,
    conflicting: bool,
}

#[derive(Debug, Default)]
struct HostState {
    repos: BTreeMap<String, FakeRepo>,
    failures: HashMap<(HostOperation, String), HostError>,
    calls: Vec<HostCall>,
    dispatches: Vec<RecordedDispatch>,
    next_id: u64,
    suppress_pr_urls: bool,
    broad_head_filter: bool,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_sha(&mut self) -> String {
        format!("{:040x}", self.next_id())
    }

    fn repo(&self, name: &str) -> HostResult<&FakeRepo> {
        self.repos
            .get(name)
            .ok_or_else(|| HostError::NotFound(format!("repository {} not found", name)))
    }

    fn repo_mut(&mut self, name: &str) -> HostResult<&mut FakeRepo> {
        self.repos
            .get_mut(name)
            .ok_or_else(|| HostError::NotFound(format!("repository {} not found", name)))
    }

    /// Record the call, then replay any injected failure for it.
    fn enter(&mut self, operation: HostOperation, repo: &str) -> HostResult<()> {
        self.calls.push(HostCall {
            operation,
            repo: repo.to_string(),
        });
        match self.failures.get(&(operation, repo.to_string())) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory [`RepoHost`] for a single owner.
#[derive(Debug)]
pub struct MemoryRepoHost {
    owner: String,
    state: Mutex<HostState>,
}

impl MemoryRepoHost {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(HostState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- setup --------------------------------------------------------------

    /// Add a repository with the given branches, each at its own commit.
    pub fn add_repository(&self, name: &str, branches: &[&str]) {
        let mut state = self.state();
        let mut repo = FakeRepo::default();
        for branch in branches {
            let sha = state.next_sha();
            repo.branches.insert(
                branch.to_string(),
                FakeBranch {
                    sha,
                    ancestors: BTreeSet::new(),
                },
            );
        }
        state.repos.insert(name.to_string(), repo);
    }

    pub fn add_archived_repository(&self, name: &str) {
        self.add_repository(name, &[]);
        if let Some(repo) = self.state().repos.get_mut(name) {
            repo.archived = true;
        }
    }

    /// Make every merge in `repo` report a conflict.
    pub fn mark_conflicting(&self, repo: &str) {
        if let Some(r) = self.state().repos.get_mut(repo) {
            r.conflicting = true;
        }
    }

    pub fn add_workflow(&self, repo: &str, name: &str, path: &str) -> u64 {
        let mut state = self.state();
        let id = state.next_id();
        if let Some(r) = state.repos.get_mut(repo) {
            r.workflows.push(Workflow {
                id,
                name: name.to_string(),
                url: format!(
                    "https://api.github.com/repos/{}/{}/actions/workflows/{}",
                    self.owner, repo, id
                ),
                path: path.to_string(),
                repository: repo.to_string(),
            });
        }
        id
    }

    /// Seed an existing pull request, bypassing validation. Returns its URL.
    pub fn add_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        state: PullRequestState,
    ) -> String {
        let mut st = self.state();
        let id = st.next_id();
        let owner = self.owner.clone();
        match st.repos.get_mut(repo) {
            Some(r) => {
                let number = r.pulls.len() as u64 + 1;
                let url = format!("https://github.com/{}/{}/pull/{}", owner, repo, number);
                r.pulls.push(PullRequest {
                    id,
                    number,
                    html_url: url.clone(),
                    state,
                    head_ref: head.to_string(),
                    base_ref: base.to_string(),
                });
                url
            }
            None => String::new(),
        }
    }

    /// Fail every `operation` against `repo` with `error`.
    pub fn fail(&self, operation: HostOperation, repo: &str, error: HostError) {
        self.state()
            .failures
            .insert((operation, repo.to_string()), error);
    }

    /// Return created pull requests without their URL, as some host
    /// responses do.
    pub fn suppress_pull_request_urls(&self) {
        self.state().suppress_pr_urls = true;
    }

    /// Ignore the `head` filter when listing pull requests, mimicking a
    /// host whose head matching is broader than exact.
    pub fn ignore_head_filter(&self) {
        self.state().broad_head_filter = true;
    }

    // -- inspection ---------------------------------------------------------

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    /// Operations issued against `repo`, in order.
    pub fn operations_for(&self, repo: &str) -> Vec<HostOperation> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.repo == repo)
            .map(|c| c.operation)
            .collect()
    }

    pub fn count(&self, operation: HostOperation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn branch_sha(&self, repo: &str, branch: &str) -> Option<String> {
        self.state()
            .repos
            .get(repo)
            .and_then(|r| r.branches.get(branch))
            .map(|b| b.sha.clone())
    }

    pub fn branch_names(&self, repo: &str) -> Vec<String> {
        self.state()
            .repos
            .get(repo)
            .map(|r| r.branches.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn pull_requests(&self, repo: &str) -> Vec<PullRequest> {
        self.state()
            .repos
            .get(repo)
            .map(|r| r.pulls.clone())
            .unwrap_or_default()
    }

    pub fn dispatches(&self) -> Vec<RecordedDispatch> {
        self.state().dispatches.clone()
    }
}

#[async_trait]
impl RepoHost for MemoryRepoHost {
    async fn get_repository(&self, _owner: &str, repo: &str) -> HostResult<Repository> {
        let mut state = self.state();
        state.enter(HostOperation::GetRepository, repo)?;
        let r = state.repo(repo)?;
        Ok(Repository {
            name: repo.to_string(),
            archived: r.archived,
        })
    }

    async fn list_org_repositories(&self, owner: &str) -> HostResult<Vec<Repository>> {
        let mut state = self.state();
        state.enter(HostOperation::ListOrgRepositories, owner)?;
        if owner != self.owner {
            return Err(HostError::NotFound(format!(
                "organization {} not found",
                owner
            )));
        }
        Ok(state
            .repos
            .iter()
            .map(|(name, r)| Repository {
                name: name.clone(),
                archived: r.archived,
            })
            .collect())
    }

    async fn get_branch(&self, _owner: &str, repo: &str, branch: &str) -> HostResult<GitRef> {
        let mut state = self.state();
        state.enter(HostOperation::GetBranch, repo)?;
        let b = state
            .repo(repo)?
            .branches
            .get(branch)
            .ok_or_else(|| HostError::NotFound(format!("branch {} not found", branch)))?;
        Ok(GitRef {
            name: format!("refs/heads/{}", branch),
            sha: b.sha.clone(),
        })
    }

    async fn create_branch(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> HostResult<GitRef> {
        let mut state = self.state();
        state.enter(HostOperation::CreateBranch, repo)?;
        let r = state.repo_mut(repo)?;
        if r.branches.contains_key(branch) {
            return Err(HostError::Validation {
                message: "Reference already exists".to_string(),
                errors: vec![],
            });
        }
        let ancestors = r
            .branches
            .values()
            .find(|b| b.sha == sha)
            .map(|b| b.ancestors.clone())
            .unwrap_or_default();
        r.branches.insert(
            branch.to_string(),
            FakeBranch {
                sha: sha.to_string(),
                ancestors,
            },
        );
        Ok(GitRef {
            name: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        })
    }

    async fn merge_branches(
        &self,
        _owner: &str,
        repo: &str,
        base: &str,
        head: &str,
        _commit_message: &str,
    ) -> HostResult<MergeResult> {
        let mut state = self.state();
        state.enter(HostOperation::MergeBranches, repo)?;
        let merge_sha = state.next_sha();
        let r = state.repo_mut(repo)?;
        let head_branch = r
            .branches
            .get(head)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("Head does not exist: {}", head)))?;
        let conflicting = r.conflicting;
        let base_branch = r
            .branches
            .get_mut(base)
            .ok_or_else(|| HostError::NotFound(format!("Base does not exist: {}", base)))?;

        if base_branch.contains(&head_branch.sha) {
            return Ok(MergeResult::NothingToMerge);
        }
        if conflicting {
            return Err(HostError::Conflict("Merge conflict".to_string()));
        }

        let previous = std::mem::replace(&mut base_branch.sha, merge_sha.clone());
        base_branch.ancestors.insert(previous);
        base_branch.ancestors.insert(head_branch.sha);
        base_branch.ancestors.extend(head_branch.ancestors);
        Ok(MergeResult::Merged { sha: merge_sha })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> HostResult<PullRequest> {
        let mut state = self.state();
        state.enter(HostOperation::CreatePullRequest, repo)?;
        let id = state.next_id();
        let suppress = state.suppress_pr_urls;
        let r = state.repo_mut(repo)?;

        let rejected = |msg: String| HostError::Validation {
            message: "Validation Failed".to_string(),
            errors: vec![msg],
        };
        let (Some(head), Some(base)) = (r.branches.get(&pull.head), r.branches.get(&pull.base))
        else {
            return Err(rejected(format!(
                "head or base ref invalid: {} -> {}",
                pull.head, pull.base
            )));
        };
        if r.pulls.iter().any(|p| {
            p.state == PullRequestState::Open && p.head_ref == pull.head && p.base_ref == pull.base
        }) {
            return Err(rejected(format!(
                "A pull request already exists for {}:{}.",
                owner, pull.head
            )));
        }
        if base.contains(&head.sha) {
            return Err(rejected(format!(
                "No commits between {} and {}",
                pull.base, pull.head
            )));
        }

        let number = r.pulls.len() as u64 + 1;
        let created = PullRequest {
            id,
            number,
            html_url: format!("https://github.com/{}/{}/pull/{}", owner, repo, number),
            state: PullRequestState::Open,
            head_ref: pull.head.clone(),
            base_ref: pull.base.clone(),
        };
        r.pulls.push(created.clone());

        if suppress {
            return Ok(PullRequest {
                html_url: String::new(),
                ..created
            });
        }
        Ok(created)
    }

    async fn list_pull_requests(
        &self,
        _owner: &str,
        repo: &str,
        filter: &PullRequestFilter,
    ) -> HostResult<Vec<PullRequest>> {
        let mut state = self.state();
        state.enter(HostOperation::ListPullRequests, repo)?;
        let broad = state.broad_head_filter;
        let owner = self.owner.as_str();
        let r = state.repo(repo)?;
        Ok(r.pulls
            .iter()
            .filter(|p| filter.state.map_or(true, |s| p.state == s))
            .filter(|p| filter.base.as_deref().map_or(true, |b| p.base_ref == b))
            .filter(|p| {
                broad
                    || filter
                        .head
                        .as_deref()
                        .map_or(true, |h| h == format!("{}:{}", owner, p.head_ref))
            })
            .cloned()
            .collect())
    }

    async fn list_workflows(&self, _owner: &str, repo: &str) -> HostResult<Vec<Workflow>> {
        let mut state = self.state();
        state.enter(HostOperation::ListWorkflows, repo)?;
        Ok(state.repo(repo)?.workflows.clone())
    }

    async fn create_workflow_dispatch(
        &self,
        _owner: &str,
        repo: &str,
        workflow_id: u64,
        git_ref: &str,
        inputs: &Map<String, Value>,
    ) -> HostResult<()> {
        let mut state = self.state();
        state.enter(HostOperation::CreateWorkflowDispatch, repo)?;
        let r = state.repo(repo)?;
        if !r.workflows.iter().any(|w| w.id == workflow_id) {
            return Err(HostError::NotFound(format!(
                "workflow {} not found",
                workflow_id
            )));
        }
        if !r.branches.contains_key(git_ref) {
            return Err(HostError::Validation {
                message: format!("No ref found for: {}", git_ref),
                errors: vec![],
            });
        }
        state.dispatches.push(RecordedDispatch::Workflow {
            repo: repo.to_string(),
            workflow_id,
            git_ref: git_ref.to_string(),
            inputs: inputs.clone(),
        });
        Ok(())
    }

    async fn create_repository_dispatch(
        &self,
        _owner: &str,
        repo: &str,
        event_type: &str,
        client_payload: &Value,
    ) -> HostResult<()> {
        let mut state = self.state();
        state.enter(HostOperation::CreateRepositoryDispatch, repo)?;
        state.repo(repo)?;
        state.dispatches.push(RecordedDispatch::Repository {
            repo: repo.to_string(),
            event_type: event_type.to_string(),
            client_payload: client_payload.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "acme";

    #[tokio::test]
    async fn test_merge_then_merge_again_is_nothing_to_merge() {
        let host = MemoryRepoHost::new(OWNER);
        host.add_repository("api", &["main", "develop"]);
        let sha = host.branch_sha("api", "main").unwrap();
        host.create_branch(OWNER, "api", "rc/v1.0.0", &sha)
            .await
            .unwrap();

        let first = host
            .merge_branches(OWNER, "api", "rc/v1.0.0", "develop", "m")
            .await
            .unwrap();
        assert!(matches!(first, MergeResult::Merged { .. }));

        let second = host
            .merge_branches(OWNER, "api", "rc/v1.0.0", "develop", "m")
            .await
            .unwrap();
        assert_eq!(second, MergeResult::NothingToMerge);
    }

    #[tokio::test]
    async fn test_duplicate_pull_request_is_rejected() {
        let host = MemoryRepoHost::new(OWNER);
        host.add_repository("api", &["main", "feature"]);
        let pull = NewPullRequest {
            title: "t".to_string(),
            body: "b".to_string(),
            head: "feature".to_string(),
            base: "main".to_string(),
        };
        host.create_pull_request(OWNER, "api", &pull).await.unwrap();
        let err = host
            .create_pull_request(OWNER, "api", &pull)
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_message(),
            Some("A pull request already exists for acme:feature.")
        );
    }

    #[tokio::test]
    async fn test_no_commits_between_identical_branches() {
        let host = MemoryRepoHost::new(OWNER);
        host.add_repository("api", &["main"]);
        let sha = host.branch_sha("api", "main").unwrap();
        host.create_branch(OWNER, "api", "rc/v1.0.0", &sha)
            .await
            .unwrap();
        let err = host
            .create_pull_request(
                OWNER,
                "api",
                &NewPullRequest {
                    title: "t".to_string(),
                    body: "b".to_string(),
                    head: "rc/v1.0.0".to_string(),
                    base: "main".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.validation_message().unwrap().starts_with("No commits"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded_and_replayed() {
        let host = MemoryRepoHost::new(OWNER);
        host.add_repository("api", &["main"]);
        host.fail(
            HostOperation::GetBranch,
            "api",
            HostError::Unauthorized("Bad credentials".to_string()),
        );
        let err = host.get_branch(OWNER, "api", "main").await.unwrap_err();
        assert!(matches!(err, HostError::Unauthorized(_)));
        assert_eq!(host.operations_for("api"), vec![HostOperation::GetBranch]);
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_qualified_head() {
        let host = MemoryRepoHost::new(OWNER);
        host.add_repository("api", &["main"]);
        host.add_pull_request("api", "rc/v1.0.0", "main", PullRequestState::Open);
        host.add_pull_request("api", "rc/v0.9.0", "main", PullRequestState::Open);

        let found = host
            .list_pull_requests(
                OWNER,
                "api",
                &PullRequestFilter::open_between(OWNER, "rc/v1.0.0", "main"),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].head_ref, "rc/v1.0.0");

        host.ignore_head_filter();
        let broad = host
            .list_pull_requests(
                OWNER,
                "api",
                &PullRequestFilter::open_between(OWNER, "rc/v1.0.0", "main"),
            )
            .await
            .unwrap();
        assert_eq!(broad.len(), 2);
    }
}
