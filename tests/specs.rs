// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests, exercising the crates together the
//! way the running system composes them.

use ambient_core::session::{RepoInput, SessionPhase, SessionRepo, SessionSpec, SessionStatus};
use ambient_events::{
    resume_events, AgEvent, AgEventKind, EventLog, Mailbox, MailboxFrame, PatchOp, PatchOpKind,
    RunId, ThreadId,
};
use ambient_providers::{resolve_working_branch, BranchInput};
use chrono::TimeZone;

fn utc(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.timestamp_opt(secs, 0).single().unwrap()
}

/// Headless session lifecycle: admission resolves the derived branch,
/// then the phase machine walks Pending → Creating → Running →
/// Completed.
#[test]
fn headless_session_lifecycle() {
    let spec = SessionSpec {
        prompt: "Summarize repo".into(),
        repos: vec![SessionRepo {
            input: RepoInput { url: "https://github.com/acme/app".into(), ..Default::default() },
            ..Default::default()
        }],
        ..Default::default()
    };

    // Branch resolution at admission, from the prompt (no display name).
    let branch = resolve_working_branch(&BranchInput {
        working_branch: spec.repos[0].input.working_branch.as_deref(),
        allow_protected_work: spec.repos[0].input.allow_protected_work,
        session_id: "sum-repo-x7k2p",
        session_display_name: &spec.prompt,
    });
    assert_eq!(branch, "ambient-summarize-repo");

    let mut status = SessionStatus::default();
    assert!(status.transition(SessionPhase::Creating, utc(0)));
    assert!(status.transition(SessionPhase::Running, utc(1)));
    assert!(status.transition(SessionPhase::Completed, utc(2)));
    assert!(status.phase.is_terminal());
}

/// Protected-branch override off: the remote `main` is shielded behind a
/// session-scoped work branch.
#[test]
fn protected_branch_override_off() {
    let branch = resolve_working_branch(&BranchInput {
        working_branch: Some("main"),
        allow_protected_work: false,
        session_id: "abc123",
        session_display_name: "whatever",
    });
    assert_eq!(branch, "work/main/abc123");
}

/// Resume after disconnect: a client that saw 100 events reconnects and
/// receives the snapshots plus everything after seq 100, without
/// duplicates or gaps.
#[test]
fn resume_after_disconnect() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path());
    let thread = ThreadId::new("sum-repo-x7k2p");
    let run = RunId::new("run-1");

    let ev = |kind| AgEvent::new(thread.clone(), run.clone(), 0, kind);
    log.append(ev(AgEventKind::RunStarted { input: None })).unwrap();
    log.append(ev(AgEventKind::StateSnapshot { state: serde_json::json!({"turn": 0}) }))
        .unwrap();
    log.append(ev(AgEventKind::MessagesSnapshot { messages: vec![] })).unwrap();
    for i in 0..110 {
        log.append(ev(AgEventKind::TextMessageContent { delta: format!("chunk {i}") })).unwrap();
    }
    log.append(ev(AgEventKind::StateDelta {
        delta: vec![PatchOp {
            op: PatchOpKind::Replace,
            path: "/turn".into(),
            value: Some(serde_json::json!(1)),
        }],
    }))
    .unwrap();

    let events = log.read_all(&thread, &run).unwrap();
    let replayed = resume_events(&events, Some(100));

    // Snapshots first, with the delta already folded into state.
    assert!(matches!(
        &replayed[0].kind,
        AgEventKind::StateSnapshot { state } if state["turn"] == 1
    ));
    assert!(matches!(&replayed[1].kind, AgEventKind::MessagesSnapshot { .. }));

    let seqs: Vec<u64> = replayed[2..].iter().filter_map(|e| e.seq).collect();
    let expected: Vec<u64> = (101..=113).collect();
    assert_eq!(seqs, expected);
}

/// The inbox carries user text and control frames in order; the runner
/// reads from its last consumed frame onward.
#[test]
fn interactive_inbox_flow() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = Mailbox::inbox(dir.path());

    inbox.append(&MailboxFrame::Message { content: "try again".into(), timestamp: 1 }).unwrap();
    inbox.append(&MailboxFrame::Interrupt { timestamp: 2 }).unwrap();
    inbox.append(&MailboxFrame::EndSession { timestamp: 3 }).unwrap();

    let tail = inbox.read_after(Some(0)).unwrap();
    assert_eq!(tail.len(), 2);
    assert!(tail[0].1.control_kind().is_some());
    assert!(matches!(tail[1].1, MailboxFrame::EndSession { .. }));
}

/// Restart preserves history: the restart counter grows monotonically
/// across repeated stop/restart cycles and the phase graph holds.
#[test]
fn repeated_restart_cycles() {
    let mut status = SessionStatus::default();
    assert!(status.transition(SessionPhase::Creating, utc(0)));
    for round in 1..=3u32 {
        assert!(status.transition(SessionPhase::Running, utc(1)));
        assert!(status.transition(SessionPhase::Stopped, utc(2)));
        assert!(status.restart());
        assert_eq!(status.restart_count, round);
        assert_eq!(status.phase, SessionPhase::Creating);
        assert!(status.start_time.is_none());
    }
}
