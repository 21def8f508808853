// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response DTOs of the HTTP surface.
//!
//! Cluster resources serialize as-is; the types here cover the
//! operations whose wire shape differs from the stored resource.

use ambient_core::session::{SessionSpec, SessionStatus};
use ambient_core::workflow::BugFixSessionType;
use ambient_core::{PermissionGrant, ProjectMeta, Role, SubjectType};
use serde::{Deserialize, Serialize};

/// `{items: [...]}` wrapper for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> Items<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Session view: name + spec + status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub name: String,
    pub project: String,
    pub spec: SessionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Body of POST /agentic-sessions. The session spec plus an optional
/// explicit name (otherwise derived from the display name or prompt).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub spec: SessionSpec,
}

/// Body of PUT /displayname.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNameRequest {
    pub display_name: String,
}

/// Server-side status update (operator/runner use): result fields only;
/// phase stays with the reconciler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub sdk_session_id: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub result_summary: Option<ambient_core::session::ResultSummary>,
}

/// Body of POST /messages: either a user message or a control frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
    /// "interrupt" or "end_session" for control messages.
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
}

/// Body of POST /projects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateProjectRequest {
    pub fn into_meta(self) -> ProjectMeta {
        ProjectMeta {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            creation_timestamp: None,
            status: None,
        }
    }
}

/// Body of PUT /projects/:p.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of GET /access.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub role: Option<Role>,
}

/// Body of POST /permissions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub subject_type: SubjectType,
    pub subject_name: String,
    pub role: Role,
}

impl GrantRequest {
    pub fn into_grant(self) -> PermissionGrant {
        PermissionGrant {
            subject_type: self.subject_type,
            subject_name: self.subject_name,
            role: self.role,
        }
    }
}

/// Body of POST /bugfix-workflows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugFixRequest {
    #[serde(default)]
    pub github_issue_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub implementation_repo: ambient_core::workflow::WorkflowRepo,
}

/// Body of POST /bugfix-workflows/:id/sessions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugFixSessionRequest {
    #[serde(default)]
    pub session_type: BugFixSessionType,
    #[serde(default)]
    pub auto_push_on_complete: bool,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of POST /rfe-workflows/:id/phase.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancePhaseRequest {
    pub agents: Vec<String>,
}

/// Body of POST /rfe-workflows/:id/jira.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishJiraRequest {
    pub path: String,
}

/// Body of POST /bugfix-workflows/:id/sync-jira.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJiraRequest {
    #[serde(default)]
    pub force: bool,
}

/// Body of PUT /runner-secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSecretValues {
    #[serde(flatten)]
    pub values: std::collections::BTreeMap<String, String>,
}
