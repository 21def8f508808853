// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ambient-events: the AG-UI event protocol and message bus.
//!
//! Events are JSON objects framed one-per-line in append-only logs under
//! `<base>/events/<threadId>/<runId>.jsonl` on the workspace volume. The
//! runner appends; the gateway replays and tails. Within a run, order is
//! append order and the `seq` field is monotonic; across runs there is no
//! ordering beyond the containing run.

pub mod bus;
pub mod fragment;
pub mod log;
pub mod mailbox;
pub mod patch;
pub mod protocol;
pub mod snapshot;

pub use bus::{StreamBus, StreamError, STREAM_BUFFER};
pub use fragment::{split_frames, PartialFrame, Reassembler};
pub use log::{EventLog, EventLogError};
pub use mailbox::{ControlKind, Mailbox, MailboxError, MailboxFrame};
pub use patch::{apply_patch, PatchError, PatchOp, PatchOpKind};
pub use protocol::{
    Activity, ActivityOp, AgEvent, AgEventKind, GroupCollector, GroupError, RunId, ThreadId,
    CODE_CANCELLED,
};
pub use snapshot::{replay_state, resume_events, synthesize_snapshots};

#[cfg(test)]
mod property_tests;
