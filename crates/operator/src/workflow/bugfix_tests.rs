// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::workflow::{BugFixWorkflowSpec, GithubIssueRef, WorkflowRepo};
use yare::parameterized;

fn session_of_type(type_label: Option<&str>) -> AgenticSession {
    let mut session =
        AgenticSession::new("s1", ambient_core::SessionSpec::builder().build().into());
    if let Some(t) = type_label {
        session
            .metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert(SESSION_TYPE_LABEL.to_string(), t.to_string());
    }
    session
}

#[test]
fn issue_body_has_all_sections_in_order() {
    let body = issue_body("Login fails on Safari", "alice");
    let sections = [
        "## Bug Description",
        "## Reproduction Steps",
        "## Expected Behavior",
        "## Actual Behavior",
        "## Additional Context",
    ];
    let mut last = 0;
    for section in sections {
        let idx = body.find(section).unwrap_or_else(|| panic!("missing {section}"));
        assert!(idx > last || last == 0);
        last = idx;
    }
    assert!(body.contains("Login fails on Safari"));
    assert!(body.contains("on behalf of alice"));
}

#[parameterized(
    review = { "bug-review", true },
    plan = { "bug-resolution-plan", true },
    implement = { "bug-implement-fix", false },
    generic = { "generic", false },
)]
fn only_review_and_plan_post_comments(label: &str, expects_comment: bool) {
    let declared = session_type(&session_of_type(Some(label)));
    let comment = completion_comment(declared, "s1", Some("findings"));
    assert_eq!(comment.is_some(), expects_comment);
    if let Some(c) = comment {
        assert!(c.contains("findings"));
        assert!(c.contains("`s1`"));
    }
}

#[test]
fn unlabeled_sessions_are_generic() {
    assert_eq!(session_type(&session_of_type(None)), BugFixSessionType::Generic);
    assert_eq!(session_type(&session_of_type(Some("bogus"))), BugFixSessionType::Generic);
}

#[test]
fn pr_body_references_and_closes_the_issue() {
    let body = pull_request_body(42, "impl-session");
    assert!(body.contains("#42"));
    assert!(body.contains("Closes #42"));
    assert!(body.contains("impl-session"));
}

#[test]
fn workflow_spec_round_trips() {
    let spec = BugFixWorkflowSpec {
        github_issue: GithubIssueRef {
            number: 42,
            url: "https://github.com/acme/app/issues/42".into(),
        },
        title: "Login broken".into(),
        description: "boom".into(),
        branch_name: "bugfix-login-42".into(),
        implementation_repo: WorkflowRepo { url: "https://github.com/acme/app".into(), branch: None },
        created_by: "alice".into(),
    };
    let wf = BugFixWorkflow::new("bf-1", spec.clone().into());
    let json = serde_json::to_value(&wf).unwrap();
    assert_eq!(json["spec"]["githubIssue"]["number"], 42);

    let back: BugFixWorkflow = serde_json::from_value(json).unwrap();
    assert_eq!(back.spec.0, spec);
}
