// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::AgEventKind;
use tempfile::tempdir;

fn event(kind: AgEventKind) -> AgEvent {
    AgEvent::new("thread-1", "run-1", 1_000, kind)
}

#[test]
fn append_assigns_monotonic_seq() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path());

    let s0 = log.append(event(AgEventKind::RunStarted { input: None })).unwrap();
    let s1 = log
        .append(event(AgEventKind::TextMessageContent { delta: "hi".into() }))
        .unwrap();
    assert_eq!((s0, s1), (0, 1));

    let events = log.read_all(&ThreadId::new("thread-1"), &RunId::new("run-1")).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].seq, Some(0));
    assert_eq!(events[1].seq, Some(1));
}

#[test]
fn seq_continues_after_reopen() {
    let dir = tempdir().unwrap();
    {
        let log = EventLog::new(dir.path());
        log.append(event(AgEventKind::RunStarted { input: None })).unwrap();
    }
    // Fresh store over the same directory picks up where the file ends.
    let log = EventLog::new(dir.path());
    let seq = log.append(event(AgEventKind::RunFinished { output: None })).unwrap();
    assert_eq!(seq, 1);
}

#[test]
fn read_after_filters_by_seq() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path());
    for i in 0..5 {
        log.append(event(AgEventKind::TextMessageContent { delta: format!("{i}") })).unwrap();
    }
    let tail = log
        .read_after(&ThreadId::new("thread-1"), &RunId::new("run-1"), Some(2))
        .unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].seq, Some(3));
}

#[test]
fn missing_run_reads_empty() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path());
    let events = log.read_all(&ThreadId::new("ghost"), &RunId::new("none")).unwrap();
    assert!(events.is_empty());
}

#[test]
fn runs_for_thread_lists_files() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path());
    for run in ["run-b", "run-a"] {
        let mut ev = event(AgEventKind::RunStarted { input: None });
        ev.run_id = RunId::new(run);
        log.append(ev).unwrap();
    }
    let runs = log.runs_for_thread(&ThreadId::new("thread-1")).unwrap();
    assert_eq!(runs, vec![RunId::new("run-a"), RunId::new("run-b")]);
}

#[tokio::test]
async fn watch_fires_on_append() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path());
    let notify = log.watch(&ThreadId::new("thread-1"), &RunId::new("run-1"));

    let notified = notify.notified();
    tokio::pin!(notified);
    // Arm the waiter before appending so the wakeup is not lost.
    futures_poll_once(&mut notified).await;

    log.append(event(AgEventKind::RunStarted { input: None })).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(1), notified)
        .await
        .expect("append should wake watchers");
}

/// Poll a future once to register interest without completing it.
async fn futures_poll_once<F: std::future::Future + Unpin>(fut: &mut F) {
    use std::task::Poll;
    std::future::poll_fn(|cx| {
        let _ = std::pin::Pin::new(&mut *fut).poll(cx);
        Poll::Ready(())
    })
    .await;
}
