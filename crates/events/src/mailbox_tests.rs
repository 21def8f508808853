// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn msg(content: &str) -> MailboxFrame {
    MailboxFrame::Message { content: content.into(), timestamp: 1_000 }
}

#[test]
fn frames_are_numbered_in_append_order() {
    let dir = tempdir().unwrap();
    let inbox = Mailbox::inbox(dir.path());

    assert_eq!(inbox.append(&msg("first")).unwrap(), 0);
    assert_eq!(inbox.append(&msg("second")).unwrap(), 1);

    let frames = inbox.read_all().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], (0, msg("first")));
    assert_eq!(frames[1], (1, msg("second")));
}

#[test]
fn read_after_skips_consumed_frames() {
    let dir = tempdir().unwrap();
    let outbox = Mailbox::outbox(dir.path());
    for i in 0..4 {
        outbox.append(&msg(&format!("{i}"))).unwrap();
    }
    let tail = outbox.read_after(Some(1)).unwrap();
    assert_eq!(tail.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn empty_mailbox_reads_empty() {
    let dir = tempdir().unwrap();
    let inbox = Mailbox::inbox(dir.path());
    assert!(inbox.read_all().unwrap().is_empty());
}

#[test]
fn inbox_and_outbox_are_disjoint() {
    let dir = tempdir().unwrap();
    let inbox = Mailbox::inbox(dir.path());
    let outbox = Mailbox::outbox(dir.path());
    inbox.append(&msg("inbound")).unwrap();
    assert!(outbox.read_all().unwrap().is_empty());
}

#[test]
fn control_frames_round_trip() {
    let dir = tempdir().unwrap();
    let inbox = Mailbox::inbox(dir.path());
    inbox.append(&MailboxFrame::Interrupt { timestamp: 5 }).unwrap();
    inbox.append(&MailboxFrame::EndSession { timestamp: 6 }).unwrap();

    let frames = inbox.read_all().unwrap();
    assert_eq!(frames[0].1.control_kind(), Some(ControlKind::Interrupt));
    assert_eq!(frames[1].1.control_kind(), Some(ControlKind::EndSession));
    assert_eq!(msg("x").control_kind(), None);
}

#[test]
fn control_frame_wire_shape() {
    let frame = MailboxFrame::EndSession { timestamp: 9 };
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["type"], "end_session");

    let parsed: MailboxFrame =
        serde_json::from_str(r#"{"type": "interrupt", "timestamp": 3}"#).unwrap();
    assert_eq!(parsed, MailboxFrame::Interrupt { timestamp: 3 });
}
