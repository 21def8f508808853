// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-Patch subset used by STATE_DELTA events.
//!
//! Only `add`, `remove`, and `replace` with JSON-Pointer paths are part of
//! the protocol; `move`/`copy`/`test` are not emitted by any runner and are
//! rejected at deserialization by the op enum.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
}

/// A single JSON-Patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    /// JSON Pointer (RFC 6901) into the state document.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Why a patch could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("invalid JSON pointer: {0}")]
    BadPointer(String),
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("{op:?} requires a value (path {path})")]
    MissingValue { op: PatchOpKind, path: String },
    #[error("array index out of bounds: {0}")]
    IndexOutOfBounds(String),
}

/// Apply a sequence of operations to `state` in order, mutating in place.
/// Fails atomically per op: the state reflects all ops before the failed one.
pub fn apply_patch(state: &mut Value, ops: &[PatchOp]) -> Result<(), PatchError> {
    for op in ops {
        apply_one(state, op)?;
    }
    Ok(())
}

fn apply_one(state: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let tokens = parse_pointer(&op.path)?;

    // Whole-document target
    if tokens.is_empty() {
        return match op.op {
            PatchOpKind::Add | PatchOpKind::Replace => {
                let value = op
                    .value
                    .clone()
                    .ok_or_else(|| PatchError::MissingValue { op: op.op, path: op.path.clone() })?;
                *state = value;
                Ok(())
            }
            PatchOpKind::Remove => {
                *state = Value::Null;
                Ok(())
            }
        };
    }

    let (last, parents) = match tokens.split_last() {
        Some(split) => split,
        None => return Err(PatchError::BadPointer(op.path.clone())),
    };

    let mut target = state;
    for token in parents {
        target = descend(target, token).ok_or_else(|| PatchError::PathNotFound(op.path.clone()))?;
    }

    match op.op {
        PatchOpKind::Add => {
            let value = op
                .value
                .clone()
                .ok_or_else(|| PatchError::MissingValue { op: op.op, path: op.path.clone() })?;
            match target {
                Value::Object(map) => {
                    map.insert(last.clone(), value);
                    Ok(())
                }
                Value::Array(arr) => {
                    if last == "-" {
                        arr.push(value);
                        return Ok(());
                    }
                    let idx: usize = last
                        .parse()
                        .map_err(|_| PatchError::BadPointer(op.path.clone()))?;
                    if idx > arr.len() {
                        return Err(PatchError::IndexOutOfBounds(op.path.clone()));
                    }
                    arr.insert(idx, value);
                    Ok(())
                }
                _ => Err(PatchError::PathNotFound(op.path.clone())),
            }
        }
        PatchOpKind::Replace => {
            let value = op
                .value
                .clone()
                .ok_or_else(|| PatchError::MissingValue { op: op.op, path: op.path.clone() })?;
            let slot =
                descend(target, last).ok_or_else(|| PatchError::PathNotFound(op.path.clone()))?;
            *slot = value;
            Ok(())
        }
        PatchOpKind::Remove => match target {
            Value::Object(map) => {
                map.remove(last.as_str())
                    .map(|_| ())
                    .ok_or_else(|| PatchError::PathNotFound(op.path.clone()))
            }
            Value::Array(arr) => {
                let idx: usize =
                    last.parse().map_err(|_| PatchError::BadPointer(op.path.clone()))?;
                if idx >= arr.len() {
                    return Err(PatchError::IndexOutOfBounds(op.path.clone()));
                }
                arr.remove(idx);
                Ok(())
            }
            _ => Err(PatchError::PathNotFound(op.path.clone())),
        },
    }
}

fn descend<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(arr) => {
            let idx: usize = token.parse().ok()?;
            arr.get_mut(idx)
        }
        _ => None,
    }
}

/// Split an RFC 6901 pointer into unescaped tokens.
fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| PatchError::BadPointer(pointer.to_string()))?;
    Ok(rest.split('/').map(|t| t.replace("~1", "/").replace("~0", "~")).collect())
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
