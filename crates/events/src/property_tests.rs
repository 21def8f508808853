// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the event protocol invariants: group
//! well-formedness, state reconstructibility, and fragment round trips.

use crate::fragment::{split_frames, Reassembler};
use crate::patch::{PatchOp, PatchOpKind};
use crate::protocol::{AgEvent, AgEventKind, GroupCollector};
use crate::snapshot::replay_state;
use ambient_core::MessageId;
use proptest::prelude::*;
use serde_json::json;

fn ev(kind: AgEventKind) -> AgEvent {
    AgEvent::new("t1", "r1", 0, kind)
}

/// Strategy: a well-formed run containing text-message groups whose deltas
/// are the chunked final text.
fn arb_run() -> impl Strategy<Value = (Vec<AgEvent>, Vec<String>)> {
    proptest::collection::vec(
        (proptest::collection::vec("[a-z ]{0,8}", 0..6), any::<bool>()),
        0..5,
    )
    .prop_map(|groups| {
        let mut events = vec![ev(AgEventKind::RunStarted { input: None })];
        let mut texts = Vec::new();
        for (i, (parts, finish_with_tool)) in groups.into_iter().enumerate() {
            let mid = MessageId::from_string(format!("msg-{i}"));
            events.push(
                ev(AgEventKind::TextMessageStart { role: "assistant".into() })
                    .with_message_id(mid.clone()),
            );
            for part in &parts {
                events.push(
                    ev(AgEventKind::TextMessageContent { delta: part.clone() })
                        .with_message_id(mid.clone()),
                );
            }
            events.push(ev(AgEventKind::TextMessageEnd).with_message_id(mid));
            texts.push(parts.concat());

            if finish_with_tool {
                let tc = ambient_core::ToolCallId::from_string(format!("tool-{i}"));
                events.push(ev(AgEventKind::ToolCallStart {
                    tool_call_id: tc.clone(),
                    name: "bash".into(),
                    parent_tool_use_id: None,
                }));
                events.push(ev(AgEventKind::ToolCallEnd {
                    tool_call_id: tc,
                    result: None,
                    error: None,
                    duration_ms: None,
                }));
            }
        }
        events.push(ev(AgEventKind::RunFinished { output: None }));
        (events, texts)
    })
}

proptest! {
    /// Concatenation of deltas equals the final text for every message
    /// group, and well-formed runs validate cleanly.
    #[test]
    fn message_groups_reassemble((events, texts) in arb_run()) {
        let mut collector = GroupCollector::new();
        for event in &events {
            collector.feed(event).unwrap();
        }
        prop_assert!(collector.is_terminal());
        for (i, expected) in texts.iter().enumerate() {
            prop_assert_eq!(
                collector.messages.get(&format!("msg-{i}")).map(String::as_str),
                Some(expected.as_str())
            );
        }
    }

    /// Replaying STATE_DELTA events after a STATE_SNAPSHOT reproduces the
    /// directly-computed document.
    #[test]
    fn state_is_reconstructible(
        keys in proptest::collection::vec("[a-z]{1,6}", 1..8),
        values in proptest::collection::vec(0i64..1000, 1..8),
    ) {
        let mut events = vec![ev(AgEventKind::StateSnapshot { state: json!({}) })];
        let mut expected = serde_json::Map::new();
        for (key, value) in keys.iter().zip(values.iter()) {
            events.push(ev(AgEventKind::StateDelta {
                delta: vec![PatchOp {
                    op: PatchOpKind::Add,
                    path: format!("/{key}"),
                    value: Some(json!(value)),
                }],
            }));
            expected.insert(key.clone(), json!(value));
        }
        let replayed = replay_state(&events);
        prop_assert_eq!(replayed, Some(serde_json::Value::Object(expected)));
    }

    /// Any payload survives fragmentation and in-order reassembly.
    #[test]
    fn fragments_round_trip(payload in "[\\PC]{1,200}", max_len in 1usize..50) {
        match split_frames("f", &payload, max_len) {
            None => prop_assert!(payload.len() <= max_len),
            Some(frames) => {
                let mut asm = Reassembler::new();
                let mut out = None;
                let count = frames.len();
                for frame in frames {
                    out = asm.push(frame).unwrap();
                }
                prop_assert!(count >= 1);
                prop_assert_eq!(out.as_deref(), Some(payload.as_str()));
            }
        }
    }

    /// Serde round trip over the envelope preserves every event.
    #[test]
    fn event_serde_round_trip((events, _) in arb_run()) {
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: AgEvent = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, event);
        }
    }
}
