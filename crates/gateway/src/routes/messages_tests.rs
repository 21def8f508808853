// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_events::{AgEventKind, ControlKind};

fn request(content: Option<&str>, message_type: Option<&str>) -> PostMessageRequest {
    PostMessageRequest {
        content: content.map(String::from),
        message_type: message_type.map(String::from),
    }
}

#[test]
fn plain_messages_become_message_frames() {
    let frame = frame_from_request(request(Some("hello"), None), 9).unwrap();
    assert_eq!(frame, MailboxFrame::Message { content: "hello".into(), timestamp: 9 });

    let frame = frame_from_request(request(Some("hi"), Some("user_message")), 9).unwrap();
    assert!(matches!(frame, MailboxFrame::Message { .. }));
}

#[test]
fn control_types_map_to_control_frames() {
    let frame = frame_from_request(request(None, Some("interrupt")), 1).unwrap();
    assert_eq!(frame.control_kind(), Some(ControlKind::Interrupt));

    let frame = frame_from_request(request(None, Some("end_session")), 1).unwrap();
    assert_eq!(frame.control_kind(), Some(ControlKind::EndSession));
}

#[test]
fn empty_and_unknown_messages_are_rejected() {
    assert!(frame_from_request(request(None, None), 1).is_err());
    assert!(frame_from_request(request(Some(""), None), 1).is_err());
    assert!(frame_from_request(request(Some("x"), Some("bogus")), 1).is_err());
}

#[test]
fn last_event_id_parses_numeric_header() {
    let mut headers = HeaderMap::new();
    assert_eq!(last_event_id(&headers), None);

    headers.insert("last-event-id", "100".parse().unwrap());
    assert_eq!(last_event_id(&headers), Some(100));

    headers.insert("last-event-id", "abc".parse().unwrap());
    assert_eq!(last_event_id(&headers), None);
}

#[test]
fn target_run_prefers_explicit_then_latest() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path());
    let thread = ThreadId::new("s1");
    for run in ["run-1", "run-2"] {
        let event = AgEvent::new("s1", run, 0, AgEventKind::RunStarted { input: None });
        log.append(event).unwrap();
    }

    assert_eq!(
        target_run(&log, &thread, Some("run-1".into())),
        Some(RunId::new("run-1"))
    );
    assert_eq!(target_run(&log, &thread, None), Some(RunId::new("run-2")));

    let empty = EventLog::new(dir.path().join("empty"));
    assert_eq!(target_run(&empty, &thread, None), None);
}
