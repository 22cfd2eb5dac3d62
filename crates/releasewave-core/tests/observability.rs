//! Observability tests for release run lifecycle tracing.
//!
//! Logs are captured with a scoped subscriber, never a global one, so each
//! test sees only the events of its own run.

use std::io::Write;
use std::sync::{Arc, Mutex};

use releasewave_core::fakes::MemoryRepoHost;
use releasewave_core::{ReleaseOrchestrator, ReleaseVersion, RunConfig};
use secrecy::SecretString;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn config() -> RunConfig {
    RunConfig::new(
        "acme",
        SecretString::new("ghp_do_not_log".into()),
        ReleaseVersion::parse("v0.9.0").unwrap(),
        "main",
    )
    .with_development_branch("develop")
}

#[tokio::test]
async fn test_conflict_run_emits_structured_events() {
    let host = Arc::new(MemoryRepoHost::new("acme"));
    host.add_repository("api", &["main", "develop"]);
    host.mark_conflicting("api");

    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .json()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    ReleaseOrchestrator::new(host.clone())
        .run(&config())
        .await
        .unwrap();

    let out = capture.contents();
    for event in [
        "run.started",
        "branch.created",
        "merge.conflict",
        "pr.created",
        "pr.rejected",
        "run.finished",
    ] {
        assert!(out.contains(event), "missing {} in:\n{}", event, out);
    }
    assert!(out.contains("releasewave.repo"));
    assert!(!out.contains("ghp_do_not_log"));
}

#[tokio::test]
async fn test_fatal_error_is_logged_with_repository() {
    let host = Arc::new(MemoryRepoHost::new("acme"));
    host.add_repository("api", &["master", "develop"]);

    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let result = ReleaseOrchestrator::new(host.clone()).run(&config()).await;
    assert!(result.is_err());

    let out = capture.contents();
    assert!(out.contains("run aborted"));
    assert!(out.contains("repo=\"api\"") || out.contains("repo=api"));
}
