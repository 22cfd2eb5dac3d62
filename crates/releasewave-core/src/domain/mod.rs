//! Domain models for ReleaseWave.
//!
//! - `RunConfig`: validated, immutable input for one run
//! - `ReleaseVersion`: `v<major>.<minor>.<patch>` and its `rc/` branch
//! - `StepOutcome` / `RepositoryOutcome` / `RunReport`: what a run produces
//! - `ReleaseError`: everything that aborts a run

pub mod config;
pub mod error;
pub mod outcome;
pub mod version;

pub use config::{RepositoryLists, RunConfig, UseCase};
pub use error::{ReleaseError, ReleaseStep, Result};
pub use outcome::{DispatchRecord, OpenReleasePr, RepositoryOutcome, RunReport, StepOutcome};
pub use version::{ReleaseVersion, RELEASE_BRANCH_PREFIX};
