// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

#[test]
fn session_type_serde_is_kebab_case() {
    let json = serde_json::to_string(&BugFixSessionType::BugResolutionPlan).unwrap();
    assert_eq!(json, "\"bug-resolution-plan\"");

    let parsed: BugFixSessionType = serde_json::from_str("\"bug-implement-fix\"").unwrap();
    assert_eq!(parsed, BugFixSessionType::BugImplementFix);
}

#[test]
fn synced_within_window() {
    let mut status = BugFixWorkflowStatus::default();
    assert!(!status.synced_within(utc(100), 60));

    status.last_synced_at = Some(utc(100));
    assert!(status.synced_within(utc(130), 60));
    assert!(!status.synced_within(utc(161), 60));
}

#[test]
fn rfe_spec_round_trips_camel_case() {
    let spec = RfeWorkflowSpec {
        title: "Add dark mode".into(),
        description: "Theme support".into(),
        branch_name: "rfe-dark-mode".into(),
        umbrella_repo: WorkflowRepo { url: "https://github.com/acme/specs".into(), branch: None },
        supporting_repos: vec![],
        project: "acme".into(),
        workspace_path: "rfe/dark-mode".into(),
        parent_outcome: None,
    };
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["branchName"], "rfe-dark-mode");
    assert_eq!(json["umbrellaRepo"]["url"], "https://github.com/acme/specs");

    let back: RfeWorkflowSpec = serde_json::from_value(json).unwrap();
    assert_eq!(back, spec);
}

#[test]
fn bugfix_phase_defaults_to_initializing() {
    let status = BugFixWorkflowStatus::default();
    assert_eq!(status.phase, BugFixPhase::Initializing);
    assert!(!status.implementation_completed);
}
