// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::patch::{PatchOp, PatchOpKind};
use serde_json::json;

fn ev(seq: u64, kind: AgEventKind) -> AgEvent {
    let mut event = AgEvent::new("t1", "r1", 0, kind);
    event.seq = Some(seq);
    event
}

fn delta(seq: u64, path: &str, value: serde_json::Value) -> AgEvent {
    ev(
        seq,
        AgEventKind::StateDelta {
            delta: vec![PatchOp { op: PatchOpKind::Add, path: path.into(), value: Some(value) }],
        },
    )
}

#[test]
fn replay_applies_deltas_after_snapshot() {
    let events = vec![
        ev(0, AgEventKind::RunStarted { input: None }),
        ev(1, AgEventKind::StateSnapshot { state: json!({"count": 0}) }),
        delta(2, "/count", json!(1)),
        delta(3, "/note", json!("working")),
    ];
    let state = replay_state(&events).unwrap();
    assert_eq!(state, json!({"count": 1, "note": "working"}));
}

#[test]
fn later_snapshot_resets_state() {
    let events = vec![
        ev(0, AgEventKind::StateSnapshot { state: json!({"a": 1}) }),
        delta(1, "/b", json!(2)),
        ev(2, AgEventKind::StateSnapshot { state: json!({"fresh": true}) }),
    ];
    assert_eq!(replay_state(&events).unwrap(), json!({"fresh": true}));
}

#[test]
fn replay_without_state_events_is_none() {
    let events = vec![ev(0, AgEventKind::RunStarted { input: None })];
    assert!(replay_state(&events).is_none());
}

#[test]
fn resume_fresh_connection_gets_full_log() {
    let events = vec![
        ev(0, AgEventKind::RunStarted { input: None }),
        ev(1, AgEventKind::TextMessageContent { delta: "x".into() }),
    ];
    let out = resume_events(&events, None);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].seq, Some(0));
}

#[test]
fn resume_replays_snapshots_then_tail() {
    let mut events = vec![
        ev(0, AgEventKind::RunStarted { input: None }),
        ev(1, AgEventKind::StateSnapshot { state: json!({"step": 1}) }),
        ev(2, AgEventKind::MessagesSnapshot { messages: vec![json!({"role": "user"})] }),
    ];
    for i in 3..10 {
        events.push(ev(i, AgEventKind::TextMessageContent { delta: format!("{i}") }));
    }
    events.push(delta(10, "/step", json!(2)));

    let out = resume_events(&events, Some(5));

    // Snapshots first: synthesized state includes the delta at seq 10.
    assert!(matches!(&out[0].kind, AgEventKind::StateSnapshot { state } if *state == json!({"step": 2})));
    assert!(matches!(&out[1].kind, AgEventKind::MessagesSnapshot { .. }));

    // Then the tail, strictly after seq 5, no gaps or duplicates.
    let seqs: Vec<u64> = out[2..].iter().filter_map(|e| e.seq).collect();
    assert_eq!(seqs, vec![6, 7, 8, 9, 10]);
}

#[test]
fn resume_synthesizes_state_without_explicit_snapshot() {
    let events = vec![
        ev(0, AgEventKind::RunStarted { input: None }),
        delta(1, "/built", json!(true)),
    ];
    let out = resume_events(&events, Some(1));
    assert!(matches!(&out[0].kind, AgEventKind::StateSnapshot { state } if *state == json!({"built": true})));
}
