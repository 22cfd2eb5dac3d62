//! Structured observability hooks for release run lifecycle events.
//!
//! This module provides:
//! - Run-scoped and repository-scoped tracing spans
//! - Emission functions for the events a release manager reads in the job log
//!
//! Components never install a subscriber. They emit into whatever subscriber
//! the caller has in scope, so tests capture output with
//! `tracing::subscriber::with_default` instead of a process-wide logger.

use tracing::{info, warn, Span};

use crate::domain::UseCase;

/// Span covering a whole run. Instrument the run future with it.
pub fn run_span(run_id: &str, use_case: UseCase, version: &str) -> Span {
    tracing::info_span!(
        "releasewave.run",
        run_id = %run_id,
        use_case = %use_case,
        version = %version,
    )
}

/// Span covering the steps for one repository.
pub fn repo_span(repo: &str) -> Span {
    tracing::info_span!("releasewave.repo", repo = %repo)
}

pub fn emit_run_started(owner: &str, repositories: usize) {
    info!(event = "run.started", owner = %owner, repositories = repositories);
}

pub fn emit_run_finished(duration_ms: u64, processed: usize, success: bool) {
    info!(
        event = "run.finished",
        duration_ms = duration_ms,
        processed = processed,
        success = success,
    );
}

pub fn emit_branch_created(repo: &str, branch: &str, sha: &str) {
    info!(event = "branch.created", repo = %repo, branch = %branch, sha = %sha);
}

pub fn emit_branch_exists(repo: &str, branch: &str) {
    info!(event = "branch.exists", repo = %repo, branch = %branch);
}

pub fn emit_merge_completed(repo: &str, head: &str, base: &str, merged: bool) {
    info!(
        event = "merge.completed",
        repo = %repo,
        head = %head,
        base = %base,
        merged = merged,
    );
}

pub fn emit_merge_conflict(repo: &str, head: &str, base: &str) {
    warn!(event = "merge.conflict", repo = %repo, head = %head, base = %base);
}

pub fn emit_pr_created(repo: &str, url: &str) {
    info!(event = "pr.created", repo = %repo, url = %url);
}

pub fn emit_pr_rejected(repo: &str, message: &str) {
    warn!(event = "pr.rejected", repo = %repo, message = %message);
}

pub fn emit_pr_recovered(repo: &str, url: &str) {
    info!(event = "pr.recovered", repo = %repo, url = %url);
}

pub fn emit_gate_evaluated(repositories: usize, open_prs: usize) {
    info!(
        event = "gate.evaluated",
        repositories = repositories,
        open_prs = open_prs,
        passed = open_prs == 0,
    );
}

pub fn emit_workflow_dispatched(repo: &str, workflow_path: &str, git_ref: &str) {
    info!(
        event = "workflow.dispatched",
        repo = %repo,
        workflow = %workflow_path,
        git_ref = %git_ref,
    );
}
