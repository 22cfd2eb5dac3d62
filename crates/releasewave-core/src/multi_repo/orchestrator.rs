//! Release batch orchestrator.
//!
//! Ties the per-repository steps into one run:
//!
//! - `Release-Creation`: for each repository in order, provision
//!   `rc/<version>` from the production branch, merge the development branch
//!   into it, then open the release pull request toward production.
//! - `Production-Release`: run the pre-release gate across every repository,
//!   and only when it is clear dispatch the production workflows.
//!
//! Execution is strictly sequential. The first fatal error aborts the run and
//! discards the outcomes collected so far; host-side effects of repositories
//! already processed stay in place.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::domain::error::Result;
use crate::domain::{RepositoryOutcome, RunConfig, RunReport, StepOutcome, UseCase};
use crate::host::RepoHost;
use crate::multi_repo::dispatcher::WorkflowDispatcher;
use crate::multi_repo::gate::{GateVerdict, PreReleaseGate};
use crate::multi_repo::integrator::ConflictAwareIntegrator;
use crate::multi_repo::provisioner::BranchProvisioner;
use crate::multi_repo::reconciler::PullRequestReconciler;
use crate::multi_repo::selector::RepositorySelector;
use crate::obs;

/// Runs one release batch against a [`RepoHost`].
pub struct ReleaseOrchestrator {
    host: Arc<dyn RepoHost>,
    selector: RepositorySelector,
    provisioner: BranchProvisioner,
    integrator: ConflictAwareIntegrator,
    reconciler: PullRequestReconciler,
    gate: PreReleaseGate,
}

impl ReleaseOrchestrator {
    pub fn new(host: Arc<dyn RepoHost>) -> Self {
        Self {
            selector: RepositorySelector::new(host.clone()),
            provisioner: BranchProvisioner::new(host.clone()),
            integrator: ConflictAwareIntegrator::new(host.clone()),
            reconciler: PullRequestReconciler::new(host.clone()),
            gate: PreReleaseGate::new(host.clone()),
            host,
        }
    }

    /// Validate `config`, select repositories and execute the configured
    /// use case inside a `releasewave.run` span.
    pub async fn run(&self, config: &RunConfig) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id, config.use_case, config.version.as_str());
        self.run_inner(config).instrument(span).await
    }

    async fn run_inner(&self, config: &RunConfig) -> Result<RunReport> {
        config.validate()?;
        let started = Instant::now();

        let repos = self
            .selector
            .select(&config.owner, config.use_case, &config.repositories)
            .await?;
        obs::emit_run_started(&config.owner, repos.len());

        let result = match config.use_case {
            UseCase::ReleaseCreation => self.create_release(config, &repos).await,
            UseCase::ProductionRelease => self.promote_to_production(config, &repos).await,
        };

        let processed = match &result {
            Ok(RunReport::Created { outcomes, .. }) => outcomes.len(),
            Ok(RunReport::Dispatched { .. }) => repos.len(),
            Ok(RunReport::Blocked { .. }) | Err(_) => 0,
        };
        obs::emit_run_finished(
            started.elapsed().as_millis() as u64,
            processed,
            matches!(&result, Ok(report) if !report.is_blocked()),
        );
        if let Err(e) = &result {
            tracing::error!(error = %e, repo = e.repository().unwrap_or_default(), "run aborted");
        }
        result
    }

    /// Provisioner → Integrator → Reconciler for every repository, in order.
    pub async fn create_release(&self, config: &RunConfig, repos: &[String]) -> Result<RunReport> {
        let release_branch = config.release_branch();
        let mut outcomes = Vec::with_capacity(repos.len());

        for repo in repos {
            let outcome = self
                .process_repository(config, repo, &release_branch)
                .instrument(obs::repo_span(repo))
                .await?;
            outcomes.push(outcome);
        }

        Ok(RunReport::Created {
            version: config.version.clone(),
            outcomes,
        })
    }

    async fn process_repository(
        &self,
        config: &RunConfig,
        repo: &str,
        release_branch: &str,
    ) -> Result<RepositoryOutcome> {
        let owner = config.owner.as_str();
        let mut outcome = RepositoryOutcome::new(repo);

        self.provisioner
            .ensure_release_branch(owner, repo, &config.production_branch, release_branch)
            .await?;

        match self
            .integrator
            .integrate(
                owner,
                repo,
                &config.development_branch,
                release_branch,
                &config.version,
            )
            .await?
        {
            StepOutcome::Success { .. } => {}
            StepOutcome::RecoverableConflict { url, error } => {
                outcome.conflict_pr_url = url;
                outcome.conflict_error = error;
            }
            StepOutcome::ValidationRejected { url, .. } => outcome.conflict_pr_url = url,
        }

        match self
            .reconciler
            .create_pull_request(
                owner,
                repo,
                release_branch,
                &config.production_branch,
                &config.pr_title,
                &config.pr_body,
            )
            .await?
        {
            StepOutcome::Success { url } | StepOutcome::RecoverableConflict { url, .. } => {
                outcome.pr_url = url
            }
            StepOutcome::ValidationRejected { message, url } => {
                outcome.pr_error = Some(message);
                outcome.pr_url = url;
            }
        }

        Ok(outcome)
    }

    /// Gate, then dispatch. A blocked gate is reported, not raised.
    pub async fn promote_to_production(
        &self,
        config: &RunConfig,
        repos: &[String],
    ) -> Result<RunReport> {
        let verdict = self
            .gate
            .check_open_release_prs(
                &config.owner,
                repos,
                &config.release_branch(),
                &config.production_branch,
            )
            .await?;

        if let GateVerdict::Blocked(open_prs) = verdict {
            tracing::warn!(open_prs = open_prs.len(), "production release blocked");
            return Ok(RunReport::Blocked {
                version: config.version.clone(),
                open_prs,
            });
        }

        let dispatches = WorkflowDispatcher::new(self.host.clone(), config.workflow_filter.clone())
            .with_repository_event(config.dispatch_event_type.clone())
            .dispatch_production(
                &config.owner,
                repos,
                &config.environment,
                &config.version,
                &config.production_branch,
            )
            .await?;

        Ok(RunReport::Dispatched {
            version: config.version.clone(),
            environment: config.environment.clone(),
            dispatches,
        })
    }
}
