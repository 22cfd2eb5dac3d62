//! Multi-repository release engine.
//!
//! Provides:
//! - [`selector::RepositorySelector`]: the working set of repositories
//! - [`provisioner::BranchProvisioner`]: idempotent `rc/<version>` creation
//! - [`integrator::ConflictAwareIntegrator`]: development merge with conflict fallback
//! - [`reconciler::PullRequestReconciler`]: PR creation with URL recovery
//! - [`gate::PreReleaseGate`]: blocks production while release PRs are open
//! - [`dispatcher::WorkflowDispatcher`]: production workflow fan-out
//! - [`orchestrator::ReleaseOrchestrator`]: sequences the above per use case
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use releasewave_core::multi_repo::ReleaseOrchestrator;
//!
//! let orchestrator = ReleaseOrchestrator::new(Arc::new(host));
//! let report = orchestrator.run(&config).await?;
//! println!("{}", report.details());
//! ```

pub mod dispatcher;
pub mod gate;
pub mod integrator;
pub mod orchestrator;
pub mod provisioner;
pub mod reconciler;
pub mod selector;

pub use dispatcher::{WorkflowDispatcher, DEFAULT_WORKFLOW_FILTER};
pub use gate::{GateVerdict, PreReleaseGate};
pub use integrator::ConflictAwareIntegrator;
pub use orchestrator::ReleaseOrchestrator;
pub use provisioner::{BranchProvision, BranchProvisioner};
pub use reconciler::PullRequestReconciler;
pub use selector::RepositorySelector;
