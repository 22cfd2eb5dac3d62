//! Run configuration.
//!
//! A [`RunConfig`] is built once from external input (CLI flags or GitHub
//! Actions inputs) and stays immutable for the run.

use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ReleaseError, Result};
use crate::domain::version::ReleaseVersion;
use crate::multi_repo::dispatcher::DEFAULT_WORKFLOW_FILTER;

/// Which release flow a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    /// Provision `rc/<version>`, merge development into it, open the
    /// release pull request.
    #[default]
    #[serde(rename = "Release-Creation")]
    ReleaseCreation,
    /// Gate on open release pull requests, then dispatch production
    /// workflows.
    #[serde(rename = "Production-Release")]
    ProductionRelease,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::ReleaseCreation => "Release-Creation",
            UseCase::ProductionRelease => "Production-Release",
        }
    }
}

impl FromStr for UseCase {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Release-Creation" => Ok(UseCase::ReleaseCreation),
            "Production-Release" => Ok(UseCase::ProductionRelease),
            other => Err(ReleaseError::InvalidConfig(format!(
                "unknown use case '{}': expected Release-Creation or Production-Release",
                other
            ))),
        }
    }
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw include/exclude lists as supplied by the operator.
///
/// The exclude strings are matched by substring containment, not parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLists {
    /// Comma-separated repository names. Non-empty means "exactly these".
    pub include: String,
    pub exclude: String,
    /// Applied only for [`UseCase::ProductionRelease`].
    pub exclude_prod_release: String,
}

/// Immutable configuration for one run.
#[derive(Debug)]
pub struct RunConfig {
    pub owner: String,
    /// Access token for the host. Never logged.
    pub token: SecretString,
    pub version: ReleaseVersion,
    pub production_branch: String,
    pub development_branch: String,
    pub pr_title: String,
    pub pr_body: String,
    pub repositories: RepositoryLists,
    pub use_case: UseCase,
    /// Environment label passed to production workflows.
    pub environment: String,
    /// Regex matched against workflow file paths.
    pub workflow_filter: String,
    /// When set, production runs also send a repository dispatch event of
    /// this type.
    pub dispatch_event_type: Option<String>,
}

impl RunConfig {
    /// Minimal configuration with the defaults used by the CLI.
    pub fn new(
        owner: impl Into<String>,
        token: SecretString,
        version: ReleaseVersion,
        production_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            token,
            version,
            production_branch: production_branch.into(),
            development_branch: String::new(),
            pr_title: "Release".to_string(),
            pr_body: "Release".to_string(),
            repositories: RepositoryLists::default(),
            use_case: UseCase::default(),
            environment: String::new(),
            workflow_filter: DEFAULT_WORKFLOW_FILTER.to_string(),
            dispatch_event_type: None,
        }
    }

    pub fn with_development_branch(mut self, branch: impl Into<String>) -> Self {
        self.development_branch = branch.into();
        self
    }

    pub fn with_use_case(mut self, use_case: UseCase) -> Self {
        self.use_case = use_case;
        self
    }

    pub fn with_repositories(mut self, repositories: RepositoryLists) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// `rc/<version>`.
    pub fn release_branch(&self) -> String {
        self.version.release_branch()
    }

    /// Check the fields the selected use case depends on.
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(ReleaseError::InvalidConfig("owner is required".to_string()));
        }
        if self.production_branch.trim().is_empty() {
            return Err(ReleaseError::InvalidConfig(
                "production_branch is required".to_string(),
            ));
        }
        match self.use_case {
            UseCase::ReleaseCreation => {
                if self.development_branch.trim().is_empty() {
                    return Err(ReleaseError::InvalidConfig(
                        "development_branch is required".to_string(),
                    ));
                }
                if self.development_branch == self.production_branch {
                    return Err(ReleaseError::InvalidConfig(
                        "development_branch and production_branch must differ".to_string(),
                    ));
                }
            }
            UseCase::ProductionRelease => {
                if self.workflow_filter.is_empty() {
                    return Err(ReleaseError::InvalidConfig(
                        "workflow_filter must not be empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
