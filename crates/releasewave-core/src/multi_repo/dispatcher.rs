//! Production workflow dispatch.

use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::error::{ReleaseError, ReleaseStep, Result};
use crate::domain::{DispatchRecord, ReleaseVersion};
use crate::host::RepoHost;
use crate::obs;

/// Workflow path pattern used when none is configured.
pub const DEFAULT_WORKFLOW_FILTER: &str = "prod-release";

/// Triggers the production workflow of every selected repository.
///
/// Workflows are chosen by matching their file path against a regex. Each
/// match receives a `workflow_dispatch` on the production branch with
/// `environment` and `release_version` inputs.
pub struct WorkflowDispatcher {
    host: Arc<dyn RepoHost>,
    filter: String,
    repository_event: Option<String>,
}

impl WorkflowDispatcher {
    pub fn new(host: Arc<dyn RepoHost>, filter: impl Into<String>) -> Self {
        Self {
            host,
            filter: filter.into(),
            repository_event: None,
        }
    }

    /// Also send a `repository_dispatch` of this type to each repository.
    pub fn with_repository_event(mut self, event_type: Option<String>) -> Self {
        self.repository_event = event_type.filter(|e| !e.trim().is_empty());
        self
    }

    pub async fn dispatch_production(
        &self,
        owner: &str,
        repos: &[String],
        environment: &str,
        version: &ReleaseVersion,
        production_branch: &str,
    ) -> Result<Vec<DispatchRecord>> {
        let pattern =
            Regex::new(&self.filter).map_err(|source| ReleaseError::InvalidWorkflowFilter {
                pattern: self.filter.clone(),
                source,
            })?;
        let inputs = dispatch_inputs(environment, version);

        let mut records = Vec::new();
        for repo in repos {
            let workflows = self
                .host
                .list_workflows(owner, repo)
                .await
                .map_err(|e| ReleaseError::step(repo, ReleaseStep::ListWorkflows, e))?;

            for workflow in workflows.into_iter().filter(|w| pattern.is_match(&w.path)) {
                self.host
                    .create_workflow_dispatch(owner, repo, workflow.id, production_branch, &inputs)
                    .await
                    .map_err(|e| ReleaseError::step(repo, ReleaseStep::DispatchWorkflow, e))?;
                obs::emit_workflow_dispatched(repo, &workflow.path, production_branch);

                records.push(DispatchRecord {
                    repository: repo.clone(),
                    workflow_id: workflow.id,
                    workflow_name: workflow.name,
                    workflow_path: workflow.path,
                });
            }

            if let Some(event_type) = &self.repository_event {
                let payload = Value::Object(inputs.clone());
                self.host
                    .create_repository_dispatch(owner, repo, event_type, &payload)
                    .await
                    .map_err(|e| ReleaseError::step(repo, ReleaseStep::RepositoryDispatch, e))?;
                tracing::info!(repo = %repo, event_type = %event_type, "repository dispatch sent");
            }
        }

        Ok(records)
    }
}

fn dispatch_inputs(environment: &str, version: &ReleaseVersion) -> Map<String, Value> {
    let mut inputs = Map::new();
    inputs.insert("environment".to_string(), Value::from(environment));
    inputs.insert("release_version".to_string(), Value::from(version.as_str()));
    inputs
}
