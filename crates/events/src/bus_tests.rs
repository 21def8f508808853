// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::AgEventKind;

fn event(delta: &str) -> AgEvent {
    AgEvent::new("t1", "r1", 0, AgEventKind::TextMessageContent { delta: delta.into() })
}

#[tokio::test]
async fn subscribers_see_published_events() {
    let bus = StreamBus::new();
    let mut sub = bus.subscribe(&ThreadId::new("t1"), &RunId::new("r1"));

    bus.publish(&event("hello"));
    let got = sub.recv().await.unwrap();
    assert_eq!(got.kind, AgEventKind::TextMessageContent { delta: "hello".into() });
}

#[tokio::test]
async fn slow_subscriber_is_disconnected_with_lag() {
    let bus = StreamBus::new();
    let mut sub = bus.subscribe(&ThreadId::new("t1"), &RunId::new("r1"));

    for i in 0..(STREAM_BUFFER + 10) {
        bus.publish(&event(&format!("{i}")));
    }
    let err = sub.recv().await.unwrap_err();
    assert!(matches!(err, StreamError::Lagged { .. }));
}

#[tokio::test]
async fn close_terminates_subscribers() {
    let bus = StreamBus::new();
    let thread = ThreadId::new("t1");
    let run = RunId::new("r1");
    let mut sub = bus.subscribe(&thread, &run);
    assert_eq!(bus.subscriber_count(&thread, &run), 1);

    bus.close(&thread, &run);
    let err = sub.recv().await.unwrap_err();
    assert_eq!(err, StreamError::Closed);
}

#[tokio::test]
async fn publish_without_subscribers_is_fine() {
    let bus = StreamBus::new();
    bus.publish(&event("unheard"));
    assert_eq!(bus.subscriber_count(&ThreadId::new("t1"), &RunId::new("r1")), 0);
}
