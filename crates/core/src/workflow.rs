// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFE and BugFix workflow contracts.
//!
//! Workflows compose many sessions and external git/issue-tracker
//! operations. They reference sessions by (project, name) — never by
//! ownership — so a session deleted out-of-band leaves no dangling
//! pointer, only a stale list entry.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A repo participating in a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRepo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// A workspace file published to Jira.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JiraLink {
    /// Workspace-relative path of the published file.
    pub path: String,
    pub jira_key: String,
}

/// Declared state of an RFE (Request for Enhancement) workflow.
///
/// The umbrella repo carries the spec tree; the branch name is unique
/// within it and shared by every session the workflow fans out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RfeWorkflowSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub branch_name: String,
    pub umbrella_repo: WorkflowRepo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supporting_repos: Vec<WorkflowRepo>,
    pub project: String,
    #[serde(default)]
    pub workspace_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_outcome: Option<String>,
}

/// Observed state of an RFE workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RfeWorkflowStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jira_links: Vec<JiraLink>,
    /// Session names created by phase advances, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_names: Vec<String>,
    #[serde(default)]
    pub seeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lifecycle phase of a BugFix workflow.
///
/// Session creation is rejected until the workflow reaches Ready (branch
/// created on the implementation repo, workspace prepared).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum BugFixPhase {
    #[default]
    Initializing,
    Ready,
}

crate::simple_display! {
    BugFixPhase {
        Initializing => "Initializing",
        Ready => "Ready",
    }
}

/// Declared type of a session inside a BugFix workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BugFixSessionType {
    BugReview,
    BugResolutionPlan,
    BugImplementFix,
    #[default]
    Generic,
}

crate::simple_display! {
    BugFixSessionType {
        BugReview => "bug-review",
        BugResolutionPlan => "bug-resolution-plan",
        BugImplementFix => "bug-implement-fix",
        Generic => "generic",
    }
}

/// The GitHub issue a BugFix workflow is anchored to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GithubIssueRef {
    pub number: u64,
    pub url: String,
}

/// Declared state of a BugFix workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BugFixWorkflowSpec {
    pub github_issue: GithubIssueRef,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub branch_name: String,
    pub implementation_repo: WorkflowRepo,
    #[serde(default)]
    pub created_by: String,
}

/// Observed state of a BugFix workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BugFixWorkflowStatus {
    #[serde(default)]
    pub phase: BugFixPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_status: Option<String>,
    #[serde(default)]
    pub implementation_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_task_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_task_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl BugFixWorkflowStatus {
    /// Whether a sync-jira call inside the recency window should be a
    /// no-op (unless forced).
    pub fn synced_within(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        match self.last_synced_at {
            Some(at) => (now - at).num_seconds() < window_secs,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
