//! ReleaseWave Core Library
//!
//! Release candidate orchestration across the repositories of an
//! organization: provision `rc/<version>` branches, merge pending work into
//! them, open release pull requests, and later gate and dispatch the
//! production deployment.
//!
//! All remote state changes go through the [`host::RepoHost`] trait.

pub mod domain;
pub mod fakes;
pub mod host;
pub mod multi_repo;
pub mod notification;
pub mod obs;
pub mod telemetry;

pub use domain::{
    DispatchRecord, OpenReleasePr, ReleaseError, ReleaseStep, ReleaseVersion, RepositoryLists,
    RepositoryOutcome, Result, RunConfig, RunReport, StepOutcome, UseCase,
};

pub use host::{
    GitRef, HostError, HostResult, MergeResult, NewPullRequest, PullRequest, PullRequestFilter,
    PullRequestState, RepoHost, Repository, Workflow,
};

pub use multi_repo::{
    BranchProvision, BranchProvisioner, ConflictAwareIntegrator, GateVerdict, PreReleaseGate,
    PullRequestReconciler, ReleaseOrchestrator, RepositorySelector, WorkflowDispatcher,
    DEFAULT_WORKFLOW_FILTER,
};

pub use notification::build_slack_payload;

/// ReleaseWave version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
