// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn small_payloads_are_not_split() {
    assert!(split_frames("f1", "short", 100).is_none());
}

#[test]
fn split_and_reassemble_round_trip() {
    let payload = "x".repeat(25);
    let frames = split_frames("f1", &payload, 10).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].total, 3);

    let mut asm = Reassembler::new();
    let mut out = None;
    for frame in frames {
        out = asm.push(frame).unwrap();
    }
    assert_eq!(out.as_deref(), Some(payload.as_str()));
    assert!(!asm.has_open_group());
}

#[test]
fn split_respects_utf8_boundaries() {
    let payload = "héllo wörld héllo wörld";
    let frames = split_frames("f1", payload, 5).unwrap();
    let mut asm = Reassembler::new();
    let mut out = None;
    for frame in frames {
        assert!(frame.data.len() <= 5);
        out = asm.push(frame).unwrap();
    }
    assert_eq!(out.as_deref(), Some(payload));
}

#[test]
fn single_fragment_group_completes_immediately() {
    let mut asm = Reassembler::new();
    let out = asm
        .push(PartialFrame { id: "f1".into(), index: 0, total: 1, data: "all".into() })
        .unwrap();
    assert_eq!(out.as_deref(), Some("all"));
}

#[test]
fn out_of_order_fragment_is_rejected() {
    let mut asm = Reassembler::new();
    let err = asm.push(PartialFrame { id: "f1".into(), index: 1, total: 2, data: "x".into() });
    assert_eq!(err, Err(FragmentError::OutOfOrder { expected: 0, got: 1 }));
}

#[test]
fn interleaved_group_is_rejected() {
    let mut asm = Reassembler::new();
    asm.push(PartialFrame { id: "f1".into(), index: 0, total: 3, data: "a".into() }).unwrap();
    let err = asm.push(PartialFrame { id: "f2".into(), index: 0, total: 2, data: "b".into() });
    assert!(matches!(err, Err(FragmentError::Interleaved { .. })));
}

#[test]
fn frame_serializes_with_partial_tag() {
    let frame = PartialFrame { id: "f1".into(), index: 0, total: 2, data: "a".into() };
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["type"], "partial");
    assert_eq!(json["index"], 0);
}
