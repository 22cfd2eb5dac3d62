//! Slack Block Kit payloads summarising a run.
//!
//! The payload is a pure function of the [`RunReport`]; nothing here talks to
//! the host or to Slack. The CLI publishes it as the `slack_payload` output.

use serde_json::{json, Value};

use crate::domain::error::Result;
use crate::domain::{DispatchRecord, OpenReleasePr, RepositoryOutcome, RunReport};

const FOOTER_GENERATED: &str = ":infinity: Generated by the *ReleaseWave*.";
const FOOTER_PLATFORM: &str = ":rocket: *ReleaseWave* platform is under development.";

/// Render the Slack payload for `report` as pretty-printed JSON.
pub fn build_slack_payload(report: &RunReport) -> Result<String> {
    let value = match report {
        RunReport::Created { version, outcomes } => blocks(
            &format!("🚀 Release Candidate Branches for {}", version),
            "Below is a compact list of RC branch PR details for review. 📋",
            &format!("*PRs by Repository:* \n\n{}", render_outcomes(outcomes)),
        ),
        RunReport::Blocked { version, open_prs } => blocks(
            &format!("⛔ Production Release Blocked for {}", version),
            "The release branch still has open pull requests. \
             Merge or close them, then rerun the production release.",
            &format!("*Open Release PRs:* \n\n{}", render_open_prs(open_prs)),
        ),
        RunReport::Dispatched {
            version,
            environment,
            dispatches,
        } => blocks(
            &format!("🚢 Production Release {} Dispatched", version),
            &format!("Deployment workflows triggered for *{}*.", environment),
            &format!("*Workflows by Repository:* \n\n{}", render_dispatches(dispatches)),
        ),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn blocks(header: &str, intro: &str, details: &str) -> Value {
    json!({
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": header }
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": intro }
            },
            { "type": "divider" },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": details }
            },
            { "type": "divider" },
            {
                "type": "context",
                "elements": [
                    { "type": "mrkdwn", "text": FOOTER_GENERATED },
                    { "type": "mrkdwn", "text": FOOTER_PLATFORM }
                ]
            }
        ]
    })
}

/// One bullet per repository. A conflict PR takes precedence over the
/// release PR, since the release PR is incomplete until the conflict is
/// resolved.
fn render_outcomes(outcomes: &[RepositoryOutcome]) -> String {
    let mut out = String::new();
    for o in outcomes {
        let error = o.pr_error.as_deref().unwrap_or_default();
        match (&o.conflict_pr_url, &o.conflict_error, &o.pr_url) {
            (Some(conflict), _, _) => out.push_str(&format!(
                "• *`{}`:*  <{}|:warning: Resolve Conflict PR> \
                 -> :pray:Then rerun the RC-automation \n",
                o.repository, conflict
            )),
            (None, Some(reason), _) => out.push_str(&format!(
                "• *`{}`:* :warning: Merge conflict, no PR could be opened ({}) \
                 -> :pray:Resolve it manually, then rerun the RC-automation \n",
                o.repository, reason
            )),
            (None, None, Some(url)) => out.push_str(&format!(
                "• *`{}`:* <{}|:white_check_mark: PR-Link> | {} \n",
                o.repository, url, error
            )),
            (None, None, None) => out.push_str(&format!(
                "• *`{}`:* {}  :white_circle:\n",
                o.repository, error
            )),
        }
    }
    out
}

fn render_open_prs(open_prs: &[OpenReleasePr]) -> String {
    let mut out = String::new();
    for pr in open_prs {
        out.push_str(&format!(
            "• *`{}`:* <{}|:hourglass: PR #{}> is still {} \n",
            pr.repository, pr.url, pr.number, pr.state
        ));
    }
    out
}

fn render_dispatches(dispatches: &[DispatchRecord]) -> String {
    if dispatches.is_empty() {
        return "No matching workflows were found. :white_circle:\n".to_string();
    }
    let mut out = String::new();
    for d in dispatches {
        out.push_str(&format!(
            "• *`{}`:* :white_check_mark: {} (`{}`)\n",
            d.repository, d.workflow_name, d.workflow_path
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseVersion;
    use crate::host::PullRequestState;

    fn version() -> ReleaseVersion {
        ReleaseVersion::parse("v1.2.3").unwrap()
    }

    fn parse(payload: &str) -> Value {
        serde_json::from_str(payload).unwrap()
    }

    fn details_text(payload: &Value) -> &str {
        payload["blocks"][3]["text"]["text"].as_str().unwrap()
    }

    #[test]
    fn test_created_payload_layout() {
        let report = RunReport::Created {
            version: version(),
            outcomes: vec![RepositoryOutcome {
                repository: "api".to_string(),
                pr_url: Some("https://github.com/acme/api/pull/7".to_string()),
                pr_error: None,
                conflict_pr_url: None,
                conflict_error: None,
            }],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());

        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(
            blocks[0]["text"]["text"],
            "🚀 Release Candidate Branches for v1.2.3"
        );
        assert_eq!(blocks[2]["type"], "divider");
        assert_eq!(blocks[5]["type"], "context");
        assert!(details_text(&payload)
            .contains("<https://github.com/acme/api/pull/7|:white_check_mark: PR-Link>"));
    }

    #[test]
    fn test_conflict_line_takes_precedence() {
        let report = RunReport::Created {
            version: version(),
            outcomes: vec![RepositoryOutcome {
                repository: "web".to_string(),
                pr_url: Some("https://github.com/acme/web/pull/2".to_string()),
                pr_error: None,
                conflict_pr_url: Some("https://github.com/acme/web/pull/1".to_string()),
                conflict_error: None,
            }],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());
        let text = details_text(&payload);
        assert!(
            text.contains("<https://github.com/acme/web/pull/1|:warning: Resolve Conflict PR>")
        );
        assert!(!text.contains("PR-Link"));
    }

    #[test]
    fn test_conflict_without_pull_request_is_flagged() {
        let mut outcome = RepositoryOutcome::new("web");
        outcome.conflict_error = Some("head or base ref invalid".to_string());
        outcome.pr_error = Some("head or base ref invalid".to_string());
        let report = RunReport::Created {
            version: version(),
            outcomes: vec![outcome],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());
        let text = details_text(&payload);
        assert!(text.contains("• *`web`:* :warning: Merge conflict, no PR could be opened"));
        assert!(text.contains("(head or base ref invalid)"));
        assert!(!text.contains(":white_circle:"));
    }

    #[test]
    fn test_rejected_without_url_renders_white_circle() {
        let mut outcome = RepositoryOutcome::new("docs");
        outcome.pr_error = Some("No commits between main and rc/v1.2.3".to_string());
        let report = RunReport::Created {
            version: version(),
            outcomes: vec![outcome],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());
        assert!(details_text(&payload)
            .contains("• *`docs`:* No commits between main and rc/v1.2.3  :white_circle:"));
    }

    #[test]
    fn test_blocked_payload_lists_open_prs() {
        let report = RunReport::Blocked {
            version: version(),
            open_prs: vec![OpenReleasePr {
                url: "https://github.com/acme/api/pull/9".to_string(),
                id: 99,
                number: 9,
                repository: "api".to_string(),
                state: PullRequestState::Open,
            }],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());
        assert!(payload["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("Blocked"));
        assert!(details_text(&payload).contains("PR #9"));
    }

    #[test]
    fn test_dispatched_payload_without_workflows() {
        let report = RunReport::Dispatched {
            version: version(),
            environment: "production".to_string(),
            dispatches: vec![],
        };
        let payload = parse(&build_slack_payload(&report).unwrap());
        assert!(details_text(&payload).contains("No matching workflows"));
    }
}
