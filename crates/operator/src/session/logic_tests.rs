// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::session::{RepoInput, SessionRepo, SessionSpec};
use chrono::TimeZone;
use k8s_openapi::api::batch::v1::JobStatus;

fn utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

fn session_with(name: &str, spec: SessionSpec) -> AgenticSession {
    AgenticSession::new(name, spec.into())
}

#[test]
fn job_status_interpretation() {
    assert_eq!(phase_from_job(None), None);
    assert_eq!(
        phase_from_job(Some(&JobStatus { active: Some(1), ..Default::default() })),
        Some(JobState::Active)
    );
    assert_eq!(
        phase_from_job(Some(&JobStatus { succeeded: Some(1), ..Default::default() })),
        Some(JobState::Succeeded)
    );
    assert_eq!(
        phase_from_job(Some(&JobStatus { failed: Some(1), ..Default::default() })),
        Some(JobState::Failed)
    );
    // Success wins over stale active counts during completion races.
    assert_eq!(
        phase_from_job(Some(&JobStatus {
            active: Some(1),
            succeeded: Some(1),
            ..Default::default()
        })),
        Some(JobState::Succeeded)
    );
}

#[test]
fn job_state_to_phase() {
    assert_eq!(JobState::Active.session_phase(), ambient_core::SessionPhase::Running);
    assert_eq!(JobState::Succeeded.session_phase(), ambient_core::SessionPhase::Completed);
    assert_eq!(JobState::Failed.session_phase(), ambient_core::SessionPhase::Failed);
}

#[test]
fn timeout_requires_a_start_time() {
    let status = SessionStatus::default();
    assert!(!timeout_exceeded(&status, 60, utc(10_000)));

    let status = SessionStatus { start_time: Some(utc(0)), ..Default::default() };
    assert!(!timeout_exceeded(&status, 60, utc(59)));
    assert!(timeout_exceeded(&status, 60, utc(60)));
}

#[test]
fn resolve_repos_records_branch_per_repo() {
    let spec = SessionSpec {
        display_name: Some("Summarize repo".into()),
        repos: vec![
            SessionRepo {
                input: RepoInput {
                    url: "https://github.com/acme/app".into(),
                    ..Default::default()
                },
                ..Default::default()
            },
            SessionRepo {
                input: RepoInput {
                    url: "https://github.com/acme/lib".into(),
                    working_branch: Some("main".into()),
                    allow_protected_work: false,
                    ..Default::default()
                },
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let session = session_with("abc123", spec);
    let repos = resolve_repos(&session, utc(42));

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].branch, "ambient-summarize-repo");
    assert_eq!(repos[1].branch, "work/main/abc123");
    assert_eq!(repos[0].cloned_at, Some(utc(42)));
}

#[test]
fn resolve_repos_falls_back_to_prompt() {
    let spec = SessionSpec {
        prompt: "Fix the flaky test".into(),
        repos: vec![SessionRepo {
            input: RepoInput { url: "https://github.com/acme/app".into(), ..Default::default() },
            ..Default::default()
        }],
        ..Default::default()
    };
    let repos = resolve_repos(&session_with("s1", spec), utc(0));
    assert_eq!(repos[0].branch, "ambient-fix-the-flaky");
}

#[test]
fn request_annotations_must_be_true() {
    let mut session = session_with("s1", SessionSpec::default());
    assert!(!stop_requested(&session));

    session
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(STOP_REQUESTED_ANNOTATION.to_string(), "false".to_string());
    assert!(!stop_requested(&session));

    session
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(STOP_REQUESTED_ANNOTATION.to_string(), "true".to_string());
    assert!(stop_requested(&session));
    assert!(!restart_requested(&session));
}

#[test]
fn content_pod_ttl() {
    assert!(!content_pod_expired(None, Some(60), utc(1_000)));
    assert!(!content_pod_expired(Some(utc(0)), None, utc(1_000)));
    assert!(!content_pod_expired(Some(utc(0)), Some(60), utc(59)));
    assert!(content_pod_expired(Some(utc(0)), Some(60), utc(61)));
}
