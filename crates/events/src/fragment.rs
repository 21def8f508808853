// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fragmentation of oversized events into `partial` frames.
//!
//! All fragments of one event are adjacent in the log; the reassembler
//! therefore only ever tracks a single open fragment group and treats an
//! interleaved foreign frame as a protocol violation.

use serde::{Deserialize, Serialize};

/// A fragment of an oversized event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", rename = "partial")]
pub struct PartialFrame {
    pub id: String,
    pub index: u32,
    pub total: u32,
    /// UTF-8 slice of the serialized event.
    pub data: String,
}

/// Split a serialized event into fragments of at most `max_len` bytes of
/// payload each. Returns `None` when the payload already fits.
pub fn split_frames(id: &str, payload: &str, max_len: usize) -> Option<Vec<PartialFrame>> {
    if payload.len() <= max_len || max_len == 0 {
        return None;
    }
    let chunks: Vec<&str> = chunk_utf8(payload, max_len);
    let total = chunks.len() as u32;
    Some(
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, data)| PartialFrame {
                id: id.to_string(),
                index: i as u32,
                total,
                data: data.to_string(),
            })
            .collect(),
    )
}

/// Chunk a string at UTF-8 boundaries, each chunk at most `max_len` bytes
/// (or one whole character when `max_len` cannot fit it).
fn chunk_utf8(s: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let mut end = rest.len().min(max_len);
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest.char_indices().nth(1).map(|(i, _)| i).unwrap_or(rest.len());
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Reassembly failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment {got} arrived out of order (expected {expected})")]
    OutOfOrder { expected: u32, got: u32 },
    #[error("fragment of {got} interleaved with open group {open}")]
    Interleaved { open: String, got: String },
    #[error("fragment total changed mid-group")]
    InconsistentTotal,
}

/// In-order reassembler for adjacent fragment groups.
#[derive(Debug, Default)]
pub struct Reassembler {
    open: Option<(String, u32, u32, String)>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next frame. Returns the reassembled payload once the final
    /// fragment arrives, `Ok(None)` while the group is still open.
    pub fn push(&mut self, frame: PartialFrame) -> Result<Option<String>, FragmentError> {
        match self.open.take() {
            None => {
                if frame.index != 0 {
                    return Err(FragmentError::OutOfOrder { expected: 0, got: frame.index });
                }
                if frame.total == 1 {
                    return Ok(Some(frame.data));
                }
                self.open = Some((frame.id, 1, frame.total, frame.data));
                Ok(None)
            }
            Some((id, next_index, total, mut buf)) => {
                if frame.id != id {
                    return Err(FragmentError::Interleaved { open: id, got: frame.id });
                }
                if frame.total != total {
                    return Err(FragmentError::InconsistentTotal);
                }
                if frame.index != next_index {
                    return Err(FragmentError::OutOfOrder { expected: next_index, got: frame.index });
                }
                buf.push_str(&frame.data);
                if frame.index + 1 == total {
                    Ok(Some(buf))
                } else {
                    self.open = Some((id, next_index + 1, total, buf));
                    Ok(None)
                }
            }
        }
    }

    /// True while a group is partially assembled.
    pub fn has_open_group(&self) -> bool {
        self.open.is_some()
    }
}

#[cfg(test)]
#[path = "fragment_tests.rs"]
mod tests;
