// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::{MessageId, ToolCallId};
use serde_json::json;

fn ev(kind: AgEventKind) -> AgEvent {
    AgEvent::new("t1", "r1", 1_000, kind)
}

#[test]
fn envelope_serializes_flat() {
    let mut event = ev(AgEventKind::TextMessageStart { role: "assistant".into() })
        .with_message_id(MessageId::from_string("msg-1"));
    event.seq = Some(7);

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "TEXT_MESSAGE_START");
    assert_eq!(json["threadId"], "t1");
    assert_eq!(json["runId"], "r1");
    assert_eq!(json["messageId"], "msg-1");
    assert_eq!(json["seq"], 7);
    assert_eq!(json["role"], "assistant");
}

#[test]
fn unknown_type_deserializes_to_unknown() {
    let event: AgEvent = serde_json::from_value(json!({
        "type": "FUTURE_EVENT",
        "threadId": "t1",
        "runId": "r1",
        "timestamp": 1,
    }))
    .unwrap();
    assert_eq!(event.kind, AgEventKind::Unknown);
}

#[test]
fn terminal_detection() {
    assert!(ev(AgEventKind::RunFinished { output: None }).is_terminal());
    assert!(ev(AgEventKind::RunError { error: "boom".into(), code: None, details: None })
        .is_terminal());
    assert!(!ev(AgEventKind::RunStarted { input: None }).is_terminal());
}

fn text_group(id: &str, parts: &[&str]) -> Vec<AgEvent> {
    let mid = MessageId::from_string(id);
    let mut events = vec![ev(AgEventKind::TextMessageStart { role: "assistant".into() })
        .with_message_id(mid.clone())];
    for part in parts {
        events.push(
            ev(AgEventKind::TextMessageContent { delta: (*part).into() })
                .with_message_id(mid.clone()),
        );
    }
    events.push(ev(AgEventKind::TextMessageEnd).with_message_id(mid));
    events
}

#[test]
fn collector_assembles_message_text() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    for event in text_group("msg-1", &["Hel", "lo ", "world"]) {
        collector.feed(&event).unwrap();
    }
    assert_eq!(collector.messages.get("msg-1").map(String::as_str), Some("Hello world"));
}

#[test]
fn collector_rejects_run_without_start() {
    let mut collector = GroupCollector::new();
    let err = collector.feed(&ev(AgEventKind::TextMessageEnd));
    assert_eq!(err, Err(GroupError::MissingRunStarted));
}

#[test]
fn collector_rejects_duplicate_start() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    let err = collector.feed(&ev(AgEventKind::RunStarted { input: None }));
    assert_eq!(err, Err(GroupError::DuplicateRunStarted));
}

#[test]
fn collector_rejects_events_after_terminal() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    collector.feed(&ev(AgEventKind::RunFinished { output: None })).unwrap();
    let err = collector.feed(&ev(AgEventKind::TextMessageEnd));
    assert_eq!(err, Err(GroupError::EventAfterTerminal));
}

#[test]
fn collector_rejects_interleaved_message_groups() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    collector
        .feed(
            &ev(AgEventKind::TextMessageStart { role: "assistant".into() })
                .with_message_id(MessageId::from_string("msg-1")),
        )
        .unwrap();
    let foreign = ev(AgEventKind::TextMessageContent { delta: "x".into() })
        .with_message_id(MessageId::from_string("msg-2"));
    let err = collector.feed(&foreign);
    assert_eq!(err, Err(GroupError::BrokenMessageGroup("msg-1".into())));
}

#[test]
fn collector_allows_interleaved_tool_calls() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();

    let a = ToolCallId::from_string("tool-a");
    let b = ToolCallId::from_string("tool-b");
    collector
        .feed(&ev(AgEventKind::ToolCallStart {
            tool_call_id: a.clone(),
            name: "read".into(),
            parent_tool_use_id: None,
        }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::ToolCallStart {
            tool_call_id: b.clone(),
            name: "grep".into(),
            parent_tool_use_id: Some(a.clone()),
        }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::ToolCallArgs { tool_call_id: b.clone(), delta: "{\"q\":1}".into() }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::ToolCallEnd {
            tool_call_id: b,
            result: None,
            error: None,
            duration_ms: Some(5),
        }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::ToolCallEnd {
            tool_call_id: a,
            result: Some(json!("ok")),
            error: None,
            duration_ms: Some(9),
        }))
        .unwrap();

    assert_eq!(collector.tool_calls.get("tool-b").map(String::as_str), Some("{\"q\":1}"));
}

#[test]
fn collector_enforces_step_nesting() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    collector
        .feed(&ev(AgEventKind::StepStarted { step_id: "s1".into(), step_name: "outer".into() }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::StepStarted { step_id: "s2".into(), step_name: "inner".into() }))
        .unwrap();

    let err = collector.feed(&ev(AgEventKind::StepFinished {
        step_id: "s1".into(),
        step_name: "outer".into(),
        duration_ms: None,
    }));
    assert_eq!(err, Err(GroupError::MisnestedStep { got: "s1".into(), expected: "s2".into() }));
}

#[test]
fn open_steps_survive_errored_run() {
    let mut collector = GroupCollector::new();
    collector.feed(&ev(AgEventKind::RunStarted { input: None })).unwrap();
    collector
        .feed(&ev(AgEventKind::StepStarted { step_id: "s1".into(), step_name: "work".into() }))
        .unwrap();
    collector
        .feed(&ev(AgEventKind::RunError { error: "oom".into(), code: None, details: None }))
        .unwrap();
    assert!(collector.is_terminal());
    assert_eq!(collector.open_steps(), ["s1".to_string()]);
}
