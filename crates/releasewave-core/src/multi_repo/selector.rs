//! Repository selection for a run.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::error::{ReleaseError, Result};
use crate::domain::{RepositoryLists, UseCase};
use crate::host::RepoHost;

/// Resolves the ordered list of repository names a run processes.
pub struct RepositorySelector {
    host: Arc<dyn RepoHost>,
}

impl RepositorySelector {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self { host }
    }

    /// Select repositories for `owner`.
    ///
    /// A non-empty include list wins: each entry must exist on the host or
    /// the run fails. Otherwise every non-archived organization repository
    /// is returned, minus those whose name is contained in the exclude
    /// string (and, for production releases, the production exclude
    /// string). Containment is a raw substring test: excluding `api` also
    /// excludes `api-gateway`.
    pub async fn select(
        &self,
        owner: &str,
        use_case: UseCase,
        lists: &RepositoryLists,
    ) -> Result<Vec<String>> {
        let included = split_include_list(&lists.include);
        if !included.is_empty() {
            for repo in &included {
                self.host.get_repository(owner, repo).await.map_err(|source| {
                    ReleaseError::RepositoryUnavailable {
                        repo: repo.clone(),
                        source,
                    }
                })?;
            }
            info!(repositories = ?included, "using explicit repository list");
            return Ok(included);
        }

        let listed = self
            .host
            .list_org_repositories(owner)
            .await
            .map_err(|source| ReleaseError::RepositoryListing {
                owner: owner.to_string(),
                source,
            })?;

        let mut selected = Vec::with_capacity(listed.len());
        for repo in listed {
            if repo.archived {
                debug!(repo = %repo.name, "skipping archived repository");
                continue;
            }
            if lists.exclude.contains(repo.name.as_str()) {
                debug!(repo = %repo.name, "skipping excluded repository");
                continue;
            }
            if use_case == UseCase::ProductionRelease
                && lists.exclude_prod_release.contains(repo.name.as_str())
            {
                debug!(repo = %repo.name, "skipping repository excluded from production release");
                continue;
            }
            selected.push(repo.name);
        }
        info!(repositories = ?selected, "selected organization repositories");
        Ok(selected)
    }
}

fn split_include_list(include: &str) -> Vec<String> {
    include
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
