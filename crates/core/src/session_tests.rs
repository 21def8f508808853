// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::arb_phase;
use proptest::prelude::*;

fn utc(ms: i64) -> DateTime<Utc> {
    chrono::TimeZone::timestamp_millis_opt(&Utc, ms).single().unwrap()
}

#[test]
fn phase_happy_path() {
    let mut status = SessionStatus::default();
    let now = utc(1_000);

    assert!(status.transition(SessionPhase::Creating, now));
    assert!(status.transition(SessionPhase::Running, now));
    assert_eq!(status.start_time, Some(now));
    assert!(status.transition(SessionPhase::Completed, utc(2_000)));
    assert_eq!(status.completion_time, Some(utc(2_000)));
}

#[test]
fn terminal_phase_rejects_forward_transition() {
    let mut status = SessionStatus::default();
    let now = utc(1_000);
    assert!(status.transition(SessionPhase::Creating, now));
    assert!(status.transition(SessionPhase::Running, now));
    assert!(status.transition(SessionPhase::Failed, now));

    assert!(!status.transition(SessionPhase::Running, now));
    assert!(!status.transition(SessionPhase::Creating, now));
    assert_eq!(status.phase, SessionPhase::Failed);
}

#[test]
fn restart_reenters_creating_and_increments_count() {
    let mut status = SessionStatus::default();
    let now = utc(1_000);
    assert!(status.transition(SessionPhase::Creating, now));
    assert!(status.transition(SessionPhase::Running, now));
    assert!(status.transition(SessionPhase::Stopped, now));

    assert!(status.restart());
    assert_eq!(status.phase, SessionPhase::Creating);
    assert_eq!(status.restart_count, 1);
    assert!(status.start_time.is_none());
    assert!(status.completion_time.is_none());
}

#[test]
fn restart_rejected_while_active() {
    let mut status = SessionStatus::default();
    assert!(!status.restart());

    assert!(status.transition(SessionPhase::Creating, utc(0)));
    assert!(!status.restart());
    assert_eq!(status.restart_count, 0);
}

#[test]
fn self_transition_is_idempotent() {
    let mut status = SessionStatus::default();
    let now = utc(1_000);
    assert!(status.transition(SessionPhase::Creating, now));
    assert!(status.transition(SessionPhase::Running, now));
    let started = status.start_time;
    assert!(status.transition(SessionPhase::Running, utc(9_000)));
    assert_eq!(status.start_time, started);
}

#[test]
fn set_condition_updates_in_place() {
    let mut status = SessionStatus::default();
    status.set_condition("WorkspaceReady", "False", Some("Provisioning".into()), None, utc(1));
    status.set_condition("WorkspaceReady", "True", None, None, utc(2));

    assert_eq!(status.conditions.len(), 1);
    let cond = &status.conditions[0];
    assert_eq!(cond.status, "True");
    assert_eq!(cond.last_transition_time, Some(utc(2)));
}

#[test]
fn set_condition_keeps_transition_time_when_status_unchanged() {
    let mut status = SessionStatus::default();
    status.set_condition("JobCreated", "True", None, None, utc(1));
    status.set_condition("JobCreated", "True", Some("Resync".into()), None, utc(5));
    assert_eq!(status.conditions[0].last_transition_time, Some(utc(1)));
}

#[test]
fn spec_accepts_initial_prompt_alias() {
    let spec: SessionSpec =
        serde_json::from_str(r#"{"initialPrompt": "fix the bug", "interactive": true}"#).unwrap();
    assert_eq!(spec.prompt, "fix the bug");
    assert!(spec.interactive);
}

#[test]
fn spec_main_repo_defaults_to_first() {
    let spec = SessionSpec::builder()
        .repos(vec![
            SessionRepo {
                input: RepoInput { url: "https://github.com/acme/app".into(), ..Default::default() },
                ..Default::default()
            },
            SessionRepo {
                input: RepoInput { url: "https://github.com/acme/lib".into(), ..Default::default() },
                ..Default::default()
            },
        ])
        .build();
    assert_eq!(spec.main_repo().map(|r| r.input.url.as_str()), Some("https://github.com/acme/app"));

    let spec = SessionSpec { main_repo_index: Some(1), ..spec };
    assert_eq!(spec.main_repo().map(|r| r.input.url.as_str()), Some("https://github.com/acme/lib"));
}

proptest! {
    /// Phase monotonicity: any sequence of accepted transitions never
    /// re-enters Creating, and once a terminal phase is reached no further
    /// transition is accepted.
    #[test]
    fn accepted_transitions_respect_graph(phases in proptest::collection::vec(arb_phase(), 1..20)) {
        let mut status = SessionStatus::default();
        let mut seen_terminal = false;
        let mut left_creating = false;
        for next in phases {
            let before = status.phase;
            let accepted = status.transition(next, utc(1_000));
            if accepted && next != before {
                prop_assert!(!seen_terminal, "transition accepted out of terminal phase");
                prop_assert!(
                    next != SessionPhase::Creating || !left_creating,
                    "Creating re-entered without restart"
                );
            }
            if status.phase != SessionPhase::Creating && before == SessionPhase::Creating {
                left_creating = true;
            }
            if status.phase.is_terminal() {
                seen_terminal = true;
            }
        }
    }

    /// Restart is the only exit from a terminal phase and always increments
    /// the restart count by exactly one.
    #[test]
    fn restart_is_sole_terminal_exit(terminal in arb_phase().prop_filter("terminal", |p| p.is_terminal())) {
        let mut status = SessionStatus { phase: terminal, ..Default::default() };
        for next in [
            SessionPhase::Pending,
            SessionPhase::Creating,
            SessionPhase::Running,
        ] {
            prop_assert!(!status.transition(next, utc(0)));
        }
        let before = status.restart_count;
        prop_assert!(status.restart());
        prop_assert_eq!(status.phase, SessionPhase::Creating);
        prop_assert_eq!(status.restart_count, before + 1);
    }
}
