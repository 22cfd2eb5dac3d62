//! Wire models for the subset of the GitHub REST API ReleaseWave calls.
//!
//! Only the fields the engine reads are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use releasewave_core::host::{GitRef, PullRequest, PullRequestState, Repository, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct RepoBody {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

impl From<RepoBody> for Repository {
    fn from(r: RepoBody) -> Self {
        Repository {
            name: r.name,
            archived: r.archived,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefBody {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: RefObject,
}

impl From<RefBody> for GitRef {
    fn from(r: RefBody) -> Self {
        GitRef {
            name: r.name,
            sha: r.object.sha,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    pub name: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct MergeRequest<'a> {
    pub base: &'a str,
    pub head: &'a str,
    pub commit_message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitBody {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchPointer {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullBody {
    pub id: u64,
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    pub state: PullRequestState,
    pub head: BranchPointer,
    pub base: BranchPointer,
}

impl From<PullBody> for PullRequest {
    fn from(p: PullBody) -> Self {
        PullRequest {
            id: p.id,
            number: p.number,
            html_url: p.html_url.unwrap_or_default(),
            state: p.state,
            head_ref: p.head.name,
            base_ref: p.base.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowBody {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub url: String,
}

impl WorkflowBody {
    pub fn into_workflow(self, repository: &str) -> Workflow {
        Workflow {
            id: self.id,
            name: self.name,
            url: self.url,
            path: self.path,
            repository: repository.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowList {
    #[serde(default)]
    pub workflows: Vec<WorkflowBody>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkflowDispatchRequest<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    pub inputs: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RepositoryDispatchRequest<'a> {
    pub event_type: &'a str,
    pub client_payload: &'a Value,
}

/// Response of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Deserialize)]
pub(crate) struct InstallationTokenBody {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// GitHub's error document: `{"message": "...", "errors": [...]}`.
///
/// Entries in `errors` are either plain strings or objects that may carry a
/// `message`; both shapes occur in practice.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl ErrorBody {
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_else(|_| ErrorBody {
            message: text.trim().to_string(),
            errors: Vec::new(),
        })
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("message").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_object_and_string_errors() {
        let body = ErrorBody::parse(
            concat!(
                r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","#,
                r#""code":"custom","#,
                r#""message":"A pull request already exists for acme:rc/v1.0.0."},"#,
                r#""plain"]}"#
            ),
        );
        assert_eq!(body.message, "Validation Failed");
        assert_eq!(
            body.error_messages(),
            vec!["A pull request already exists for acme:rc/v1.0.0.", "plain"]
        );
    }

    #[test]
    fn test_error_body_without_message_entries() {
        let body = ErrorBody::parse(
            concat!(
                r#"{"message":"Validation Failed","#,
                r#""errors":[{"resource":"PullRequest","field":"head","code":"invalid"}]}"#
            ),
        );
        assert!(body.error_messages().is_empty());
    }

    #[test]
    fn test_error_body_non_json_falls_back_to_text() {
        let body = ErrorBody::parse("Bad Gateway\n");
        assert_eq!(body.message, "Bad Gateway");
    }

    #[test]
    fn test_installation_token_body() {
        let body: InstallationTokenBody = serde_json::from_str(
            concat!(
                r#"{"token":"ghs_abc","expires_at":"2026-10-16T12:00:00Z","#,
                r#""permissions":{"contents":"write"}}"#
            ),
        )
        .unwrap();
        assert_eq!(body.token, "ghs_abc");
        assert_eq!(
            body.expires_at.map(|t| t.to_rfc3339()),
            Some("2026-10-16T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_pull_body_without_url() {
        let pull: PullBody = serde_json::from_str(
            concat!(
                r#"{"id":5,"number":2,"state":"open","#,
                r#""head":{"ref":"rc/v1.0.0"},"base":{"ref":"main"}}"#
            ),
        )
        .unwrap();
        let pr = PullRequest::from(pull);
        assert_eq!(pr.html_url, "");
        assert_eq!(pr.head_ref, "rc/v1.0.0");
        assert_eq!(pr.state, PullRequestState::Open);
    }
}
