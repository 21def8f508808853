// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::session::SessionPhase;
use kube::Resource;

#[test]
fn session_crd_coordinates() {
    assert_eq!(AgenticSession::group(&()), "vteam.ambient-code");
    assert_eq!(AgenticSession::version(&()), "v1alpha1");
    assert_eq!(AgenticSession::kind(&()), "AgenticSession");
    assert_eq!(AgenticSession::plural(&()), "agenticsessions");
}

#[test]
fn workflow_crd_coordinates() {
    assert_eq!(RfeWorkflow::kind(&()), "RfeWorkflow");
    assert_eq!(BugFixWorkflow::kind(&()), "BugFixWorkflow");
    assert_eq!(ProjectSettings::plural(&()), "projectsettings");
}

#[test]
fn session_spec_serializes_transparently() {
    let spec = ambient_core::SessionSpec::builder().prompt("Fix the login bug").build();
    let session = AgenticSession::new("fix-login-abc12", spec.into());
    let json = serde_json::to_value(&session).unwrap();

    // The wrapper must not introduce a nesting level.
    assert_eq!(json["spec"]["prompt"], "Fix the login bug");
    assert_eq!(json["apiVersion"], "vteam.ambient-code/v1alpha1");
}

#[test]
fn session_round_trips_with_status() {
    let spec = ambient_core::SessionSpec::builder().build();
    let mut session = AgenticSession::new("s1", spec.into());
    session.status = Some(ambient_core::SessionStatus {
        phase: SessionPhase::Running,
        restart_count: 2,
        ..Default::default()
    });

    let json = serde_json::to_string(&session).unwrap();
    let back: AgenticSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status.as_ref().map(|s| s.phase), Some(SessionPhase::Running));
    assert_eq!(back.status.map(|s| s.restart_count), Some(2));
}

#[test]
fn settings_spec_defaults_are_empty() {
    let spec: ProjectSettingsSpec = serde_json::from_str("{}").unwrap();
    assert!(spec.runner_secrets_name.is_none());
    assert!(spec.group_access.is_empty());
}
