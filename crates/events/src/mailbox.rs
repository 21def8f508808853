// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox/outbox mailboxes for interactive sessions.
//!
//! Two append-only queues of numbered JSON frames live on the workspace
//! volume: `inbox/` (gateway writes, runner reads) and `outbox/` (runner
//! writes, gateway reads). Frame files are zero-padded so lexicographic
//! directory order equals append order.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Width of the zero-padded frame number in file names.
const FRAME_PAD: usize = 6;

/// Control message kinds understood by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Interrupt,
    EndSession,
}

/// One framed mailbox message, distinguished by its `type` field.
///
/// `interrupt` asks the agent to yield at the next safe point;
/// `end_session` requests graceful termination, after which the
/// reconciler moves the session to Completed once the job exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MailboxFrame {
    /// Freeform user (or agent) message.
    Message {
        content: String,
        timestamp: i64,
    },
    Interrupt {
        timestamp: i64,
    },
    EndSession {
        timestamp: i64,
    },
}

impl MailboxFrame {
    /// The control signal this frame carries, if any.
    pub fn control_kind(&self) -> Option<ControlKind> {
        match self {
            MailboxFrame::Interrupt { .. } => Some(ControlKind::Interrupt),
            MailboxFrame::EndSession { .. } => Some(ControlKind::EndSession),
            MailboxFrame::Message { .. } => None,
        }
    }
}

/// Mailbox failure.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed frame {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An append-only directory of numbered JSON frames.
#[derive(Debug, Clone)]
pub struct Mailbox {
    dir: PathBuf,
}

impl Mailbox {
    /// The session inbox under a workspace root.
    pub fn inbox(workspace: impl Into<PathBuf>) -> Self {
        Self { dir: workspace.into().join("inbox") }
    }

    /// The session outbox under a workspace root.
    pub fn outbox(workspace: impl Into<PathBuf>) -> Self {
        Self { dir: workspace.into().join("outbox") }
    }

    /// Append a frame, returning its assigned number.
    pub fn append(&self, frame: &MailboxFrame) -> Result<u64, MailboxError> {
        fs::create_dir_all(&self.dir)
            .map_err(|source| MailboxError::Io { path: self.dir.clone(), source })?;
        let next = self.frame_numbers()?.last().map(|n| n + 1).unwrap_or(0);
        let path = self.dir.join(format!("{next:0width$}.json", width = FRAME_PAD));
        let body = serde_json::to_vec(frame)
            .map_err(|source| MailboxError::Malformed { path: path.clone(), source })?;
        // Write-then-rename so readers never observe a partial frame.
        let tmp = self.dir.join(format!(".{next:0width$}.json.tmp", width = FRAME_PAD));
        fs::write(&tmp, body).map_err(|source| MailboxError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &path)
            .map_err(|source| MailboxError::Io { path: path.clone(), source })?;
        Ok(next)
    }

    /// Read frames with numbers strictly greater than `after` (all when None).
    pub fn read_after(
        &self,
        after: Option<u64>,
    ) -> Result<Vec<(u64, MailboxFrame)>, MailboxError> {
        let mut frames = Vec::new();
        for number in self.frame_numbers()? {
            if let Some(after) = after {
                if number <= after {
                    continue;
                }
            }
            let path = self.dir.join(format!("{number:0width$}.json", width = FRAME_PAD));
            let body =
                fs::read(&path).map_err(|source| MailboxError::Io { path: path.clone(), source })?;
            let frame = serde_json::from_slice(&body)
                .map_err(|source| MailboxError::Malformed { path: path.clone(), source })?;
            frames.push((number, frame));
        }
        Ok(frames)
    }

    /// All frames in append order.
    pub fn read_all(&self) -> Result<Vec<(u64, MailboxFrame)>, MailboxError> {
        self.read_after(None)
    }

    fn frame_numbers(&self) -> Result<Vec<u64>, MailboxError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(MailboxError::Io { path: self.dir.clone(), source }),
        };
        let mut numbers = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|source| MailboxError::Io { path: self.dir.clone(), source })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(stem) = name.strip_suffix(".json") {
                if let Ok(n) = stem.parse::<u64>() {
                    numbers.push(n);
                }
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
