// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AG-UI event vocabulary.
//!
//! Serializes with `{"type": "RUN_STARTED", ...envelope, ...fields}`.
//! Unknown type tags deserialize to `Unknown` so newer runners can emit
//! events older control planes pass through untouched.

use crate::patch::PatchOp;
use ambient_core::{MessageId, ToolCallId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Error code attached to the terminal RUN_ERROR emitted when a stream is
/// cancelled by stop/delete.
pub const CODE_CANCELLED: &str = "cancelled";

/// Identifier of an event thread (one per session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

/// Identifier of a run within a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

macro_rules! string_id_impls {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id_impls!(ThreadId);
string_id_impls!(RunId);

/// An activity addressable by id (plan steps, todos, background work).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Mutation kind for ACTIVITY_DELTA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityOp {
    Add,
    Update,
    Remove,
}

/// One framed event: common envelope plus the variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgEvent {
    pub thread_id: ThreadId,
    pub run_id: RunId,
    /// Epoch milliseconds at emission.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<RunId>,
    /// Monotonic position within the run, assigned at append time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub kind: AgEventKind,
}

impl AgEvent {
    pub fn new(thread_id: impl Into<ThreadId>, run_id: impl Into<RunId>, timestamp: i64, kind: AgEventKind) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            timestamp,
            message_id: None,
            parent_run_id: None,
            seq: None,
            kind,
        }
    }

    pub fn with_message_id(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// A terminal event closes the run; nothing may follow it.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, AgEventKind::RunFinished { .. } | AgEventKind::RunError { .. })
    }
}

/// Event variants of the AG-UI protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum AgEventKind {
    #[serde(rename = "RUN_STARTED")]
    RunStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<serde_json::Value>,
    },

    #[serde(rename = "RUN_FINISHED")]
    RunFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },

    #[serde(rename = "RUN_ERROR")]
    RunError {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },

    #[serde(rename = "STEP_STARTED")]
    StepStarted { step_id: String, step_name: String },

    #[serde(rename = "STEP_FINISHED")]
    StepFinished {
        step_id: String,
        step_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },

    #[serde(rename = "TEXT_MESSAGE_START")]
    TextMessageStart { role: String },

    #[serde(rename = "TEXT_MESSAGE_CONTENT")]
    TextMessageContent { delta: String },

    #[serde(rename = "TEXT_MESSAGE_END")]
    TextMessageEnd,

    #[serde(rename = "TOOL_CALL_START")]
    ToolCallStart {
        tool_call_id: ToolCallId,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<ToolCallId>,
    },

    #[serde(rename = "TOOL_CALL_ARGS")]
    ToolCallArgs { tool_call_id: ToolCallId, delta: String },

    #[serde(rename = "TOOL_CALL_END")]
    ToolCallEnd {
        tool_call_id: ToolCallId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },

    #[serde(rename = "STATE_SNAPSHOT")]
    StateSnapshot { state: serde_json::Value },

    #[serde(rename = "STATE_DELTA")]
    StateDelta { delta: Vec<PatchOp> },

    #[serde(rename = "MESSAGES_SNAPSHOT")]
    MessagesSnapshot { messages: Vec<serde_json::Value> },

    #[serde(rename = "ACTIVITY_SNAPSHOT")]
    ActivitySnapshot { activities: Vec<Activity> },

    #[serde(rename = "ACTIVITY_DELTA")]
    ActivityDelta { op: ActivityOp, activity: Activity },

    /// Opaque pass-through; carries no semantics the core interprets.
    #[serde(rename = "RAW")]
    Raw { data: serde_json::Value },

    /// Catch-all for unknown event types (forward compatibility).
    #[serde(other, skip_serializing)]
    Unknown,
}

impl AgEventKind {
    /// Stable wire tag for logging and SSE event-type hints.
    pub fn type_name(&self) -> &'static str {
        match self {
            AgEventKind::RunStarted { .. } => "RUN_STARTED",
            AgEventKind::RunFinished { .. } => "RUN_FINISHED",
            AgEventKind::RunError { .. } => "RUN_ERROR",
            AgEventKind::StepStarted { .. } => "STEP_STARTED",
            AgEventKind::StepFinished { .. } => "STEP_FINISHED",
            AgEventKind::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            AgEventKind::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            AgEventKind::TextMessageEnd => "TEXT_MESSAGE_END",
            AgEventKind::ToolCallStart { .. } => "TOOL_CALL_START",
            AgEventKind::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            AgEventKind::ToolCallEnd { .. } => "TOOL_CALL_END",
            AgEventKind::StateSnapshot { .. } => "STATE_SNAPSHOT",
            AgEventKind::StateDelta { .. } => "STATE_DELTA",
            AgEventKind::MessagesSnapshot { .. } => "MESSAGES_SNAPSHOT",
            AgEventKind::ActivitySnapshot { .. } => "ACTIVITY_SNAPSHOT",
            AgEventKind::ActivityDelta { .. } => "ACTIVITY_DELTA",
            AgEventKind::Raw { .. } => "RAW",
            AgEventKind::Unknown => "UNKNOWN",
        }
    }
}

/// Violation of the event-group invariants within a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("first event of a run must be RUN_STARTED")]
    MissingRunStarted,
    #[error("duplicate RUN_STARTED")]
    DuplicateRunStarted,
    #[error("event after terminal RUN_FINISHED/RUN_ERROR")]
    EventAfterTerminal,
    #[error("text-message group {0} is not contiguous")]
    BrokenMessageGroup(String),
    #[error("tool-call event for unopened call {0}")]
    UnopenedToolCall(String),
    #[error("tool-call {0} closed twice")]
    DoubleClosedToolCall(String),
    #[error("STEP_FINISHED without matching STEP_STARTED: {0}")]
    UnmatchedStepFinish(String),
    #[error("steps not properly nested: finished {got}, expected {expected}")]
    MisnestedStep { got: String, expected: String },
}

/// Streaming validator/collector over a single run's events.
///
/// Enforces the grouping invariants and assembles delta concatenations so
/// callers (and the property tests) can compare them with final values.
#[derive(Debug, Default)]
pub struct GroupCollector {
    started: bool,
    terminal: bool,
    /// Open text message (id, role, accumulated text).
    open_message: Option<(String, String, String)>,
    /// Completed messages by id.
    pub messages: HashMap<String, String>,
    /// Open tool calls: id → accumulated args.
    open_tool_calls: HashMap<String, String>,
    /// Completed tool calls: id → accumulated args.
    pub tool_calls: HashMap<String, String>,
    /// Open step stack (step ids).
    step_stack: Vec<String>,
}

impl GroupCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the run saw a terminal event.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Steps still open (legal only when the run errored).
    pub fn open_steps(&self) -> &[String] {
        &self.step_stack
    }

    pub fn feed(&mut self, event: &AgEvent) -> Result<(), GroupError> {
        if self.terminal {
            return Err(GroupError::EventAfterTerminal);
        }
        if !self.started {
            match event.kind {
                AgEventKind::RunStarted { .. } => {
                    self.started = true;
                    return Ok(());
                }
                _ => return Err(GroupError::MissingRunStarted),
            }
        }

        // A text-message group must be contiguous: while one is open, only
        // its own CONTENT/END events may appear.
        if let Some((ref open_id, _, _)) = self.open_message {
            let same_group = matches!(
                event.kind,
                AgEventKind::TextMessageContent { .. } | AgEventKind::TextMessageEnd
            ) && event.message_id.as_ref().map(|m| m.as_str()) == Some(open_id.as_str());
            if !same_group {
                return Err(GroupError::BrokenMessageGroup(open_id.clone()));
            }
        }

        match &event.kind {
            AgEventKind::RunStarted { .. } => return Err(GroupError::DuplicateRunStarted),
            AgEventKind::RunFinished { .. } | AgEventKind::RunError { .. } => {
                self.terminal = true;
            }
            AgEventKind::TextMessageStart { role } => {
                let id = event
                    .message_id
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_default();
                self.open_message = Some((id, role.clone(), String::new()));
            }
            AgEventKind::TextMessageContent { delta } => match self.open_message {
                Some((_, _, ref mut text)) => text.push_str(delta),
                None => {
                    return Err(GroupError::BrokenMessageGroup(
                        event.message_id.as_ref().map(|m| m.to_string()).unwrap_or_default(),
                    ))
                }
            },
            AgEventKind::TextMessageEnd => match self.open_message.take() {
                Some((id, _, text)) => {
                    self.messages.insert(id, text);
                }
                None => return Err(GroupError::BrokenMessageGroup(String::new())),
            },
            AgEventKind::ToolCallStart { tool_call_id, .. } => {
                self.open_tool_calls.insert(tool_call_id.to_string(), String::new());
            }
            AgEventKind::ToolCallArgs { tool_call_id, delta } => {
                match self.open_tool_calls.get_mut(tool_call_id.as_str()) {
                    Some(args) => args.push_str(delta),
                    None => return Err(GroupError::UnopenedToolCall(tool_call_id.to_string())),
                }
            }
            AgEventKind::ToolCallEnd { tool_call_id, .. } => {
                match self.open_tool_calls.remove(tool_call_id.as_str()) {
                    Some(args) => {
                        if self.tool_calls.insert(tool_call_id.to_string(), args).is_some() {
                            return Err(GroupError::DoubleClosedToolCall(
                                tool_call_id.to_string(),
                            ));
                        }
                    }
                    None => return Err(GroupError::UnopenedToolCall(tool_call_id.to_string())),
                }
            }
            AgEventKind::StepStarted { step_id, .. } => {
                self.step_stack.push(step_id.clone());
            }
            AgEventKind::StepFinished { step_id, .. } => match self.step_stack.pop() {
                Some(expected) if expected == *step_id => {}
                Some(expected) => {
                    return Err(GroupError::MisnestedStep { got: step_id.clone(), expected })
                }
                None => return Err(GroupError::UnmatchedStepFinish(step_id.clone())),
            },
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
