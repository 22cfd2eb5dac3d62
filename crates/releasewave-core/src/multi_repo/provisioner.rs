//! Idempotent release branch provisioning.

use std::sync::Arc;

use crate::domain::error::{ReleaseError, ReleaseStep, Result};
use crate::host::RepoHost;
use crate::obs;

/// What [`BranchProvisioner::ensure_release_branch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchProvision {
    Created { sha: String },
    AlreadyExists,
}

/// Ensures `rc/<version>` exists in a repository.
pub struct BranchProvisioner {
    host: Arc<dyn RepoHost>,
}

impl BranchProvisioner {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self { host }
    }

    /// Create `release_branch` at the tip of `base_branch` unless it already
    /// exists. An existing branch is left untouched, whatever it points at.
    pub async fn ensure_release_branch(
        &self,
        owner: &str,
        repo: &str,
        base_branch: &str,
        release_branch: &str,
    ) -> Result<BranchProvision> {
        let base = self
            .host
            .get_branch(owner, repo, base_branch)
            .await
            .map_err(|e| ReleaseError::step(repo, ReleaseStep::ResolveBaseBranch, e))?;

        match self.host.get_branch(owner, repo, release_branch).await {
            Ok(_) => {
                obs::emit_branch_exists(repo, release_branch);
                return Ok(BranchProvision::AlreadyExists);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(ReleaseError::step(repo, ReleaseStep::LookupReleaseBranch, e)),
        }

        self.host
            .create_branch(owner, repo, release_branch, &base.sha)
            .await
            .map_err(|e| ReleaseError::step(repo, ReleaseStep::CreateReleaseBranch, e))?;
        obs::emit_branch_created(repo, release_branch, &base.sha);

        Ok(BranchProvision::Created { sha: base.sha })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{HostOperation, MemoryRepoHost};
    use crate::host::HostError;

    const OWNER: &str = "acme";

    #[tokio::test]
    async fn test_creates_branch_at_base_tip() {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["main", "develop"]);
        let main_sha = host.branch_sha("api", "main").unwrap();

        let provisioner = BranchProvisioner::new(host.clone());
        let result = provisioner
            .ensure_release_branch(OWNER, "api", "main", "rc/v1.0.0")
            .await
            .unwrap();

        assert_eq!(result, BranchProvision::Created { sha: main_sha.clone() });
        assert_eq!(host.branch_sha("api", "rc/v1.0.0"), Some(main_sha));
    }

    #[tokio::test]
    async fn test_second_call_is_a_no_op() {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["main"]);
        let provisioner = BranchProvisioner::new(host.clone());

        provisioner
            .ensure_release_branch(OWNER, "api", "main", "rc/v1.0.0")
            .await
            .unwrap();
        let second = provisioner
            .ensure_release_branch(OWNER, "api", "main", "rc/v1.0.0")
            .await
            .unwrap();

        assert_eq!(second, BranchProvision::AlreadyExists);
        assert_eq!(host.count(HostOperation::CreateBranch), 1);
        assert_eq!(host.branch_names("api"), vec!["main", "rc/v1.0.0"]);
    }

    #[tokio::test]
    async fn test_missing_base_branch_is_fatal() {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["master"]);
        let provisioner = BranchProvisioner::new(host.clone());

        let err = provisioner
            .ensure_release_branch(OWNER, "api", "main", "rc/v1.0.0")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReleaseError::Step {
                step: ReleaseStep::ResolveBaseBranch,
                ..
            }
        ));
        assert_eq!(host.count(HostOperation::CreateBranch), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let host = Arc::new(MemoryRepoHost::new(OWNER));
        host.add_repository("api", &["main"]);
        host.fail(
            HostOperation::CreateBranch,
            "api",
            HostError::Unauthorized("Resource not accessible by integration".to_string()),
        );
        let provisioner = BranchProvisioner::new(host.clone());

        let err = provisioner
            .ensure_release_branch(OWNER, "api", "main", "rc/v1.0.0")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Step {
                step: ReleaseStep::CreateReleaseBranch,
                ..
            }
        ));
    }
}
