// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn op(kind: PatchOpKind, path: &str, value: Option<serde_json::Value>) -> PatchOp {
    PatchOp { op: kind, path: path.to_string(), value }
}

#[test]
fn add_to_object_and_array() {
    let mut state = json!({"todo": ["a"]});
    apply_patch(
        &mut state,
        &[
            op(PatchOpKind::Add, "/phase", Some(json!("running"))),
            op(PatchOpKind::Add, "/todo/-", Some(json!("b"))),
            op(PatchOpKind::Add, "/todo/0", Some(json!("first"))),
        ],
    )
    .unwrap();
    assert_eq!(state, json!({"phase": "running", "todo": ["first", "a", "b"]}));
}

#[test]
fn replace_and_remove() {
    let mut state = json!({"a": {"b": 1}, "list": [1, 2, 3]});
    apply_patch(
        &mut state,
        &[
            op(PatchOpKind::Replace, "/a/b", Some(json!(2))),
            op(PatchOpKind::Remove, "/list/1", None),
        ],
    )
    .unwrap();
    assert_eq!(state, json!({"a": {"b": 2}, "list": [1, 3]}));
}

#[test]
fn whole_document_replace() {
    let mut state = json!({"old": true});
    apply_patch(&mut state, &[op(PatchOpKind::Replace, "", Some(json!({"new": 1})))]).unwrap();
    assert_eq!(state, json!({"new": 1}));
}

#[test]
fn escaped_pointer_tokens() {
    let mut state = json!({"a/b": {"c~d": 1}});
    apply_patch(&mut state, &[op(PatchOpKind::Replace, "/a~1b/c~0d", Some(json!(2)))]).unwrap();
    assert_eq!(state, json!({"a/b": {"c~d": 2}}));
}

#[test]
fn replace_missing_path_fails() {
    let mut state = json!({});
    let err = apply_patch(&mut state, &[op(PatchOpKind::Replace, "/nope", Some(json!(1)))]);
    assert_eq!(err, Err(PatchError::PathNotFound("/nope".into())));
}

#[test]
fn remove_missing_key_fails() {
    let mut state = json!({"a": 1});
    let err = apply_patch(&mut state, &[op(PatchOpKind::Remove, "/b", None)]);
    assert_eq!(err, Err(PatchError::PathNotFound("/b".into())));
}

#[test]
fn add_without_value_fails() {
    let mut state = json!({});
    let err = apply_patch(&mut state, &[op(PatchOpKind::Add, "/a", None)]);
    assert!(matches!(err, Err(PatchError::MissingValue { .. })));
}

#[test]
fn pointer_without_leading_slash_fails() {
    let mut state = json!({});
    let err = apply_patch(&mut state, &[op(PatchOpKind::Add, "a", Some(json!(1)))]);
    assert!(matches!(err, Err(PatchError::BadPointer(_))));
}

#[test]
fn earlier_ops_stick_when_a_later_op_fails() {
    let mut state = json!({});
    let _ = apply_patch(
        &mut state,
        &[
            op(PatchOpKind::Add, "/kept", Some(json!(true))),
            op(PatchOpKind::Replace, "/missing", Some(json!(1))),
        ],
    );
    assert_eq!(state, json!({"kept": true}));
}
