//! GitHub REST client implementing [`RepoHost`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use releasewave_core::host::{
    GitRef, HostError, HostResult, MergeResult, NewPullRequest, PullRequest, PullRequestFilter,
    RepoHost, Repository, Workflow,
};

use crate::error::GitHubError;
use crate::models::{
    CommitBody, CreateRefRequest, ErrorBody, MergeRequest, PullBody, RefBody, RepoBody,
    RepositoryDispatchRequest, WorkflowDispatchRequest, WorkflowList,
};
use crate::Result;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Connection settings for [`GitHubClient`].
pub struct GitHubConfig {
    /// Personal access token or installation token
    pub token: SecretString,
    /// API root; GitHub Enterprise Server uses `https://<host>/api/v3`
    pub base_url: String,
    pub user_agent: String,
}

impl GitHubConfig {
    /// Config for api.github.com.
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Parse an API root and make sure relative joins land beneath it.
pub(crate) fn api_root(url: &str) -> Result<Url> {
    let trimmed = url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let parsed = Url::parse(&with_slash).map_err(|e| GitHubError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(GitHubError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(parsed)
}

/// `Authorization: Bearer <token>`, marked sensitive so it never shows up in
/// debug output.
pub(crate) fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| GitHubError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

/// reqwest client with the GitHub media type and API version preset, plus a
/// default bearer token when one is given.
pub(crate) fn http_client(user_agent: &str, token: Option<&SecretString>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, bearer(token.expose_secret())?);
    }

    Ok(Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .build()?)
}

pub(crate) fn default_user_agent() -> String {
    format!("releasewave/{}", releasewave_core::VERSION)
}

/// [`RepoHost`] over the GitHub REST API.
pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let base_url = api_root(&config.base_url)?;
        let http = http_client(&config.user_agent, Some(&config.token))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> HostResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| HostError::Transport(format!("invalid request path {}: {}", path, e)))?;
        debug!(method = %method, url = %url, "github request");
        Ok(self.http.request(method, url))
    }

    async fn send(&self, builder: RequestBuilder) -> HostResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> HostResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HostError::Decode(e.to_string()))
    }

    /// Follow `page=1,2,...` with `per_page=100` until a short page.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> HostResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1.. {
            let builder = self
                .request(Method::GET, path)?
                .query(query)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let batch: Vec<T> = self.send_json(builder).await?;
            let short = batch.len() < PER_PAGE;
            items.extend(batch);
            if short {
                break;
            }
        }
        Ok(items)
    }
}

pub(crate) async fn error_from_response(response: Response) -> HostError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body = ErrorBody::parse(&text);
    let message = if body.message.is_empty() {
        status.to_string()
    } else {
        body.message.clone()
    };

    match status {
        StatusCode::NOT_FOUND => HostError::NotFound(message),
        StatusCode::CONFLICT => HostError::Conflict(message),
        StatusCode::UNPROCESSABLE_ENTITY => HostError::Validation {
            errors: body.error_messages(),
            message,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HostError::Unauthorized(message),
        other => HostError::Api {
            status: other.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn get_repository(&self, owner: &str, repo: &str) -> HostResult<Repository> {
        let body: RepoBody = self
            .send_json(self.request(Method::GET, &format!("repos/{}/{}", owner, repo))?)
            .await?;
        Ok(body.into())
    }

    async fn list_org_repositories(&self, owner: &str) -> HostResult<Vec<Repository>> {
        let repos: Vec<RepoBody> = self
            .get_paginated(&format!("orgs/{}/repos", owner), &[])
            .await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> HostResult<GitRef> {
        let body: RefBody = self
            .send_json(self.request(
                Method::GET,
                &format!("repos/{}/{}/git/ref/heads/{}", owner, repo, branch),
            )?)
            .await?;
        Ok(body.into())
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> HostResult<GitRef> {
        let request = CreateRefRequest {
            name: format!("refs/heads/{}", branch),
            sha,
        };
        let body: RefBody = self
            .send_json(
                self.request(Method::POST, &format!("repos/{}/{}/git/refs", owner, repo))?
                    .json(&request),
            )
            .await?;
        Ok(body.into())
    }

    async fn merge_branches(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> HostResult<MergeResult> {
        let request = MergeRequest {
            base,
            head,
            commit_message,
        };
        let response = self
            .send(
                self.request(Method::POST, &format!("repos/{}/{}/merges", owner, repo))?
                    .json(&request),
            )
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(MergeResult::NothingToMerge);
        }
        let commit: CommitBody = response
            .json()
            .await
            .map_err(|e| HostError::Decode(e.to_string()))?;
        Ok(MergeResult::Merged { sha: commit.sha })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> HostResult<PullRequest> {
        let body: PullBody = self
            .send_json(
                self.request(Method::POST, &format!("repos/{}/{}/pulls", owner, repo))?
                    .json(pull),
            )
            .await?;
        Ok(body.into())
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullRequestFilter,
    ) -> HostResult<Vec<PullRequest>> {
        let mut query = Vec::new();
        if let Some(head) = &filter.head {
            query.push(("head", head.clone()));
        }
        if let Some(base) = &filter.base {
            query.push(("base", base.clone()));
        }
        if let Some(state) = filter.state {
            query.push(("state", state.as_str().to_string()));
        }
        let pulls: Vec<PullBody> = self
            .get_paginated(&format!("repos/{}/{}/pulls", owner, repo), &query)
            .await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> HostResult<Vec<Workflow>> {
        let list: WorkflowList = self
            .send_json(
                self.request(
                    Method::GET,
                    &format!("repos/{}/{}/actions/workflows", owner, repo),
                )?
                .query(&[("per_page", PER_PAGE.to_string())]),
            )
            .await?;
        Ok(list
            .workflows
            .into_iter()
            .map(|w| w.into_workflow(repo))
            .collect())
    }

    async fn create_workflow_dispatch(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
        git_ref: &str,
        inputs: &Map<String, Value>,
    ) -> HostResult<()> {
        let request = WorkflowDispatchRequest { git_ref, inputs };
        self.send(
            self.request(
                Method::POST,
                &format!(
                    "repos/{}/{}/actions/workflows/{}/dispatches",
                    owner, repo, workflow_id
                ),
            )?
            .json(&request),
        )
        .await?;
        Ok(())
    }

    async fn create_repository_dispatch(
        &self,
        owner: &str,
        repo: &str,
        event_type: &str,
        client_payload: &Value,
    ) -> HostResult<()> {
        let request = RepositoryDispatchRequest {
            event_type,
            client_payload,
        };
        self.send(
            self.request(Method::POST, &format!("repos/{}/{}/dispatches", owner, repo))?
                .json(&request),
        )
        .await?;
        Ok(())
    }
}
