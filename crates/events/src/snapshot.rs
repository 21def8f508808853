// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot and resume semantics.
//!
//! On reconnect the server sends the latest STATE_SNAPSHOT and
//! MESSAGES_SNAPSHOT followed by every later event. When a run never
//! emitted a snapshot, one is synthesized by replaying the log.

use crate::patch::apply_patch;
use crate::protocol::{AgEvent, AgEventKind};
use serde_json::Value;

/// Replay a run's events into the current state document: the last
/// STATE_SNAPSHOT with every subsequent STATE_DELTA applied. Returns
/// `None` when the run carries no state at all.
pub fn replay_state(events: &[AgEvent]) -> Option<Value> {
    let mut state: Option<Value> = None;
    for event in events {
        match &event.kind {
            AgEventKind::StateSnapshot { state: snapshot } => {
                state = Some(snapshot.clone());
            }
            AgEventKind::StateDelta { delta } => {
                // Deltas before any snapshot build on an empty document.
                let doc = state.get_or_insert_with(|| Value::Object(Default::default()));
                if let Err(e) = apply_patch(doc, delta) {
                    // A broken delta invalidates derived state but not the
                    // log itself; keep the last good document.
                    tracing::warn!(seq = ?event.seq, error = %e, "skipping unappliable state delta");
                }
            }
            _ => {}
        }
    }
    state
}

/// The latest snapshots carried by the log, synthesizing the state
/// snapshot from deltas when necessary.
pub fn synthesize_snapshots(events: &[AgEvent]) -> (Option<Value>, Option<Vec<Value>>) {
    let state = replay_state(events);
    let messages = events.iter().rev().find_map(|e| match &e.kind {
        AgEventKind::MessagesSnapshot { messages } => Some(messages.clone()),
        _ => None,
    });
    (state, messages)
}

/// Events to send on resume after `last_seq`: synthesized snapshots (as
/// fresh snapshot events cloned from the newest ones on the log) followed
/// by every event with a later sequence number. No duplicates, no gaps.
/// A fresh connection (`last_seq` = None) gets the full log verbatim.
pub fn resume_events(events: &[AgEvent], last_seq: Option<u64>) -> Vec<AgEvent> {
    let Some(last) = last_seq else {
        return events.to_vec();
    };

    let mut out = Vec::new();
    let (state, messages) = synthesize_snapshots(events);

    // Template envelope from any event on the log.
    if let Some(template) = events.first() {
        if let Some(state) = state {
            let mut ev = template.clone();
            ev.kind = AgEventKind::StateSnapshot { state };
            ev.message_id = None;
            ev.seq = None;
            out.push(ev);
        }
        if let Some(messages) = messages {
            let mut ev = template.clone();
            ev.kind = AgEventKind::MessagesSnapshot { messages };
            ev.message_id = None;
            ev.seq = None;
            out.push(ev);
        }
    }

    for event in events {
        let newer = event.seq.map(|seq| seq > last).unwrap_or(false);
        // Snapshots are already represented above.
        let is_snapshot = matches!(
            event.kind,
            AgEventKind::StateSnapshot { .. } | AgEventKind::MessagesSnapshot { .. }
        );
        if newer && !is_snapshot {
            out.push(event.clone());
        }
    }
    out
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
