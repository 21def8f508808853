// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ambient-core: Data model for the Ambient control plane.
//!
//! Holds the cluster-resource data contract (sessions, workflows, projects,
//! access control) plus the pure logic shared by the gateway and operator:
//! phase state machines, role semantics, naming rules, and the error
//! taxonomy. Everything here is serde-serializable and free of I/O.

pub mod macros;

pub mod access;
pub mod clock;
pub mod error;
pub mod id;
pub mod naming;
pub mod project;
pub mod session;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use access::{AccessKeyMeta, Operation, PermissionGrant, Role, SubjectType};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ApiError, ErrorKind};
pub use id::{short, KeyId, MessageId, ToolCallId, WorkflowId};
pub use naming::{
    content_pod_name, content_service_name, job_name, normalize_git_url, session_name,
    workspace_pvc_name,
};
pub use project::{ProjectMeta, ANNOTATION_DESCRIPTION, ANNOTATION_DISPLAY_NAME, MANAGED_LABEL};
#[cfg(any(test, feature = "test-support"))]
pub use session::SessionSpecBuilder;
pub use session::{
    ActiveWorkflow, LlmSettings, ReconciledRepo, RepoInput, RepoOutput, RepoSync, ResourceOverrides,
    ResultSummary, SessionCondition, SessionPhase, SessionRepo, SessionSpec, SessionStatus,
    UserContext,
};
pub use workflow::{
    BugFixPhase, BugFixSessionType, BugFixWorkflowSpec, BugFixWorkflowStatus, JiraLink,
    RfeWorkflowSpec, RfeWorkflowStatus,
};
