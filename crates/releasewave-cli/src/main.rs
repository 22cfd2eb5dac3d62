//! ReleaseWave CLI
//!
//! The `releasewave` command cuts release candidates across the repositories
//! of an organization, or promotes an existing candidate to production.
//!
//! ## Use cases
//!
//! - `Release-Creation`: create `rc/<version>` in every repository, merge the
//!   development branch into it and open a release PR toward production
//! - `Production-Release`: refuse while release PRs are still open, then
//!   dispatch each repository's production workflow
//!
//! Runs as a GitHub Action (inputs arrive as `INPUT_*` variables, outputs go
//! to `$GITHUB_OUTPUT`) or from a terminal with flags. Authenticates with a
//! token or as a GitHub App installation.

mod actions;
mod inputs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use releasewave_core::telemetry::{init_tracing, parse_level};
use releasewave_core::{build_slack_payload, ReleaseError, ReleaseOrchestrator, RunReport};
use releasewave_github::{AppAuthenticator, GitHubClient, GitHubConfig, DEFAULT_API_URL};

use crate::actions::StepOutputs;
use crate::inputs::{Cli, Credentials};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json, parse_level(cli.log_level()));

    let in_actions = actions::in_actions(std::env::var("GITHUB_ACTIONS").ok().as_deref());
    if in_actions {
        for secret in cli.secrets() {
            for command in actions::mask_commands(secret) {
                println!("{}", command);
            }
        }
    }

    cli.release_version()?;
    let api_url = cli
        .api_url(std::env::var("GITHUB_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let token = match cli.credentials()? {
        Credentials::Token(token) => token,
        Credentials::App(app) => {
            let token = AppAuthenticator::new(&api_url, app)?
                .installation_token()
                .await
                .context("failed to obtain GitHub App installation token")?;
            if in_actions {
                for command in actions::mask_commands(token.expose_secret()) {
                    println!("{}", command);
                }
            }
            token
        }
    };
    let config = cli.run_config(token).context("invalid configuration")?;

    let github = GitHubConfig::new(SecretString::new(config.token.expose_secret().into()))
        .with_base_url(api_url);
    let client = GitHubClient::new(github).context("failed to create GitHub client")?;
    info!(
        owner = %config.owner,
        use_case = %config.use_case,
        version = %config.version,
        api = %client.base_url(),
        "starting release run"
    );

    let report = ReleaseOrchestrator::new(Arc::new(client))
        .run(&config)
        .await?;

    publish(&report)?;

    if let RunReport::Blocked { open_prs, .. } = report {
        return Err(ReleaseError::ReleaseBlocked { open_prs }.into());
    }
    Ok(())
}

/// Log the per-repository details and emit the step outputs.
fn publish(report: &RunReport) -> Result<()> {
    let details = report.details();
    let payload = build_slack_payload(report).context("failed to build Slack payload")?;
    info!("PR details:\n{}", details);

    let output_file = std::env::var_os("GITHUB_OUTPUT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let outputs = StepOutputs::new(output_file.as_deref());
    outputs.set("pr_urls", &details)?;
    outputs.set("slack_payload", &payload)?;
    Ok(())
}
