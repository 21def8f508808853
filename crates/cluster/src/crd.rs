// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom resource definitions for the `vteam.ambient-code` group.
//!
//! The spec/status field contracts live in ambient-core; the wrappers
//! here only attach the kube machinery. Sessions own their workspace
//! volume, job, and content sidecar through owner references; workflows
//! reference sessions by name and own nothing.

use ambient_core::session::{SessionSpec, SessionStatus};
use ambient_core::workflow::{
    BugFixWorkflowSpec, BugFixWorkflowStatus, RfeWorkflowSpec, RfeWorkflowStatus,
};
use ambient_core::PermissionGrant;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of every control-plane resource.
pub const GROUP: &str = "vteam.ambient-code";

/// API version of every control-plane resource.
pub const VERSION: &str = "v1alpha1";

/// Declarative unit of AI work. See [`SessionSpec`] for the contract.
#[derive(CustomResource, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vteam.ambient-code",
    version = "v1alpha1",
    kind = "AgenticSession",
    plural = "agenticsessions",
    namespaced,
    status = "SessionStatus"
)]
#[serde(transparent)]
pub struct AgenticSessionSpec(pub SessionSpec);

impl std::ops::Deref for AgenticSessionSpec {
    type Target = SessionSpec;

    fn deref(&self) -> &SessionSpec {
        &self.0
    }
}

impl std::ops::DerefMut for AgenticSessionSpec {
    fn deref_mut(&mut self) -> &mut SessionSpec {
        &mut self.0
    }
}

impl From<SessionSpec> for AgenticSessionSpec {
    fn from(spec: SessionSpec) -> Self {
        Self(spec)
    }
}

/// Multi-phase enhancement workflow fanning out to many sessions.
#[derive(CustomResource, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vteam.ambient-code",
    version = "v1alpha1",
    kind = "RfeWorkflow",
    plural = "rfeworkflows",
    namespaced,
    status = "RfeWorkflowStatus"
)]
#[serde(transparent)]
pub struct RfeWorkflowSpecWrapper(pub RfeWorkflowSpec);

impl std::ops::Deref for RfeWorkflowSpecWrapper {
    type Target = RfeWorkflowSpec;

    fn deref(&self) -> &RfeWorkflowSpec {
        &self.0
    }
}

impl From<RfeWorkflowSpec> for RfeWorkflowSpecWrapper {
    fn from(spec: RfeWorkflowSpec) -> Self {
        Self(spec)
    }
}

/// Issue-anchored pipeline of typed sessions.
#[derive(CustomResource, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vteam.ambient-code",
    version = "v1alpha1",
    kind = "BugFixWorkflow",
    plural = "bugfixworkflows",
    namespaced,
    status = "BugFixWorkflowStatus"
)]
#[serde(transparent)]
pub struct BugFixWorkflowSpecWrapper(pub BugFixWorkflowSpec);

impl std::ops::Deref for BugFixWorkflowSpecWrapper {
    type Target = BugFixWorkflowSpec;

    fn deref(&self) -> &BugFixWorkflowSpec {
        &self.0
    }
}

impl From<BugFixWorkflowSpec> for BugFixWorkflowSpecWrapper {
    fn from(spec: BugFixWorkflowSpec) -> Self {
        Self(spec)
    }
}

/// Per-namespace singleton (named `settings`) holding project-level
/// configuration the operator and gateway share.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vteam.ambient-code",
    version = "v1alpha1",
    kind = "ProjectSettings",
    plural = "projectsettings",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettingsSpec {
    /// Name of the opaque Secret mounted into every session job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_secrets_name: Option<String>,
    /// Role grants by subject, unique per (subjectType, subjectName).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_access: Vec<PermissionGrant>,
    /// Bot service accounts sessions may run as.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bot_accounts: Vec<String>,
}

/// Canonical name of the ProjectSettings singleton.
pub const PROJECT_SETTINGS_NAME: &str = "settings";

/// Annotation the gateway sets to request a session stop.
pub const STOP_REQUESTED_ANNOTATION: &str = "ambient-code.io/stop-requested";

/// Annotation the gateway sets to request a session restart.
pub const RESTART_REQUESTED_ANNOTATION: &str = "ambient-code.io/restart-requested";

/// Label linking a session to its owning workflow.
pub const WORKFLOW_LABEL: &str = "ambient-code.io/workflow";

/// Label carrying a bugfix session's declared type.
pub const SESSION_TYPE_LABEL: &str = "ambient-code.io/session-type";

/// Annotation requesting RFE seeding.
pub const SEED_REQUESTED_ANNOTATION: &str = "ambient-code.io/seed-requested";

/// Annotation carrying the comma-separated agent list of a phase advance.
pub const ADVANCE_AGENTS_ANNOTATION: &str = "ambient-code.io/advance-agents";

/// Annotation carrying the workspace path of an RFE Jira publication.
pub const PUBLISH_JIRA_ANNOTATION: &str = "ambient-code.io/publish-jira";

/// Annotation requesting a BugFix Jira sync ("true" or "force").
pub const SYNC_JIRA_ANNOTATION: &str = "ambient-code.io/sync-jira";

/// Annotation enabling auto-push/PR on a bug-implement-fix session.
pub const AUTO_PUSH_ANNOTATION: &str = "ambient-code.io/auto-push";

/// Annotation marking a session whose completion side effects ran.
pub const EFFECTS_APPLIED_ANNOTATION: &str = "ambient-code.io/effects-applied";

#[cfg(test)]
#[path = "crd_tests.rs"]
mod tests;
