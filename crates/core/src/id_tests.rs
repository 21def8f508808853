// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generated_ids_carry_prefix_and_are_unique() {
    let a = WorkflowId::new();
    let b = WorkflowId::new();
    assert!(a.as_str().starts_with("wf-"));
    assert_ne!(a, b);
}

#[test]
fn generated_ids_are_dns_safe() {
    let id = KeyId::new();
    assert!(id
        .as_str()
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
}

#[test]
fn suffix_strips_prefix() {
    let id = MessageId::from_string("msg-abc123");
    assert_eq!(id.suffix(), "abc123");

    // Foreign strings pass through unchanged
    let id = MessageId::from_string("external-id");
    assert_eq!(id.suffix(), "external-id");
}

#[test]
fn id_serde_is_transparent() {
    let id = ToolCallId::from_string("tool-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tool-xyz\"");

    let parsed: ToolCallId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn id_equality_with_str() {
    let id = WorkflowId::from_string("wf-1");
    assert_eq!(id, "wf-1");
    assert_eq!(id, *"wf-1");
}

#[test]
fn short_truncates() {
    assert_eq!(short("abcdef", 3), "abc");
    assert_eq!(short("ab", 3), "ab");
    assert_eq!(short("", 3), "");
}
