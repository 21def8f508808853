// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgenticSession spec/status contract and phase state machine.
//!
//! A session is the declarative unit of AI work: prompt + repos + resource
//! envelope. The spec half is written by the gateway on user request; the
//! status half is owned by the operator. Phase transitions are monotonic
//! except for restart, which re-enters Creating from any terminal phase and
//! increments the restart count.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default session timeout (seconds) when the spec does not carry one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Lifecycle phase of a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum SessionPhase {
    #[default]
    Pending,
    Creating,
    Running,
    Completed,
    Failed,
    Stopped,
    Error,
}

crate::simple_display! {
    SessionPhase {
        Pending => "Pending",
        Creating => "Creating",
        Running => "Running",
        Completed => "Completed",
        Failed => "Failed",
        Stopped => "Stopped",
        Error => "Error",
    }
}

impl SessionPhase {
    /// Terminal phases can only be left via an explicit restart.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::Completed | SessionPhase::Failed | SessionPhase::Stopped
                | SessionPhase::Error
        )
    }

    /// True while the workload may still be producing events.
    pub fn is_active(self) -> bool {
        matches!(self, SessionPhase::Creating | SessionPhase::Running)
    }

    /// Whether the reconciler may move a session from `self` to `next`
    /// without a restart. Self-transitions are permitted (idempotent
    /// status rewrites during resync).
    pub fn can_transition(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Creating)
                | (Pending, Stopped)
                | (Creating, Running)
                | (Creating, Failed)
                | (Creating, Error)
                | (Creating, Stopped)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Stopped)
                | (Running, Error)
        )
    }

    /// Restart is only legal from a terminal phase; it re-enters Creating.
    pub fn can_restart(self) -> bool {
        self.is_terminal()
    }
}

/// LLM parameters forwarded to the in-pod runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    8192
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Identity of the requesting user, captured at session creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Compute/storage overrides for the session workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_class: Option<String>,
}

/// Upstream sync source for a mirrored input repo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoSync {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Input side of a declared repo: where the agent clones from and which
/// branch it works on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoInput {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_branch: Option<String>,
    #[serde(default)]
    pub allow_protected_work: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<RepoSync>,
}

/// Output side of a declared repo: where results are pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoOutput {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// A repo mapping declared on the session spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRepo {
    pub input: RepoInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RepoOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Workflow selection attached to a session (RFE/BugFix linkage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkflow {
    pub git_url: String,
    pub branch: String,
    pub path: String,
}

/// Declared state of an agentic session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    /// The task prompt handed to the runner. `initialPrompt` is accepted
    /// as a legacy alias.
    #[serde(alias = "initialPrompt")]
    pub prompt: String,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub llm_settings: LlmSettings,
    /// Wall-clock budget in seconds; exceeded sessions are failed with
    /// reason `timeout`.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_overrides: Option<ResourceOverrides>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<SessionRepo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_repo_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_workflow: Option<ActiveWorkflow>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SessionSpec {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            interactive: false,
            display_name: None,
            llm_settings: LlmSettings::default(),
            timeout: DEFAULT_TIMEOUT_SECS,
            user_context: None,
            bot_account: None,
            resource_overrides: None,
            environment_variables: BTreeMap::new(),
            repos: Vec::new(),
            main_repo_index: None,
            active_workflow: None,
        }
    }
}

impl SessionSpec {
    /// The repo the runner treats as its primary checkout.
    pub fn main_repo(&self) -> Option<&SessionRepo> {
        let idx = self.main_repo_index.unwrap_or(0);
        self.repos.get(idx)
    }
}

/// A declared repo after admission: the branch the runner will actually
/// commit to, resolved by the deterministic naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRepo {
    pub url: String,
    /// Resolved working branch, visible to clients before execution.
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_at: Option<DateTime<Utc>>,
}

/// Status condition in the Kubernetes style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    /// "True" / "False" / "Unknown"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Numeric run summary reported by the runner's final status payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

/// Observed state of an agentic session. Written only by the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub phase: SessionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reconciled_repos: Vec<ReconciledRepo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciled_workflow: Option<ActiveWorkflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
    #[serde(default)]
    pub restart_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<SessionCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<ResultSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl SessionStatus {
    /// Apply a phase transition, enforcing the state machine. Returns false
    /// (and leaves the status untouched) when the transition is illegal.
    pub fn transition(&mut self, next: SessionPhase, now: DateTime<Utc>) -> bool {
        if !self.phase.can_transition(next) {
            return false;
        }
        if self.phase == next {
            return true;
        }
        if next == SessionPhase::Running && self.start_time.is_none() {
            self.start_time = Some(now);
        }
        if next.is_terminal() {
            self.completion_time = Some(now);
        }
        self.phase = next;
        true
    }

    /// Restart: terminal phase → Creating, bumping the restart count and
    /// clearing per-run result state. The workspace volume is preserved by
    /// the reconciler so the runner can resume from its last commit.
    pub fn restart(&mut self) -> bool {
        if !self.phase.can_restart() {
            return false;
        }
        self.phase = SessionPhase::Creating;
        self.restart_count += 1;
        self.completion_time = None;
        self.start_time = None;
        self.result = None;
        self.result_summary = None;
        true
    }

    /// Upsert a condition by type, updating the transition timestamp only
    /// when the status value changes.
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: Option<String>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) {
        if let Some(existing) =
            self.conditions.iter_mut().find(|c| c.condition_type == condition_type)
        {
            if existing.status != status {
                existing.last_transition_time = Some(now);
            }
            existing.status = status.to_string();
            existing.reason = reason;
            existing.message = message;
            return;
        }
        self.conditions.push(SessionCondition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            reason,
            message,
            last_transition_time: Some(now),
        });
    }
}

crate::builder! {
    pub struct SessionSpecBuilder => SessionSpec {
        into {
            prompt: String = "Summarize the repository",
        }
        set {
            interactive: bool = false,
            llm_settings: LlmSettings = LlmSettings::default(),
            timeout: u64 = DEFAULT_TIMEOUT_SECS,
            environment_variables: BTreeMap<String, String> = BTreeMap::new(),
            repos: Vec<SessionRepo> = Vec::new(),
        }
        option {
            display_name: String = None,
            user_context: UserContext = None,
            bot_account: String = None,
            resource_overrides: ResourceOverrides = None,
            main_repo_index: usize = None,
            active_workflow: ActiveWorkflow = None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
