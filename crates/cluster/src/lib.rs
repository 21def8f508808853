// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ambient-cluster: the Kubernetes contract of the control plane.
//!
//! Custom resources of the `vteam.ambient-code/v1alpha1` group, the
//! per-request impersonated client factory, managed-namespace helpers,
//! access keys, permission grants, and runner-secret configuration.

pub mod access_probe;
pub mod client;
pub mod crd;
pub mod installations;
pub mod keys;
pub mod namespaces;
pub mod permissions;
pub mod secrets;
pub mod workloads;

pub use access_probe::highest_role;
pub use client::{ClientFactory, ClusterError, Identity};
pub use crd::{
    AgenticSession, AgenticSessionSpec, BugFixWorkflow, BugFixWorkflowSpecWrapper,
    ProjectSettings, ProjectSettingsSpec, RfeWorkflow, RfeWorkflowSpecWrapper,
    ADVANCE_AGENTS_ANNOTATION, AUTO_PUSH_ANNOTATION, EFFECTS_APPLIED_ANNOTATION, GROUP,
    PROJECT_SETTINGS_NAME, PUBLISH_JIRA_ANNOTATION, RESTART_REQUESTED_ANNOTATION,
    SEED_REQUESTED_ANNOTATION, SESSION_TYPE_LABEL, STOP_REQUESTED_ANNOTATION,
    SYNC_JIRA_ANNOTATION, VERSION, WORKFLOW_LABEL,
};
pub use installations::InstallationStore;
pub use keys::{AccessKeyStore, NewKeyRequest, RevealedKey, StoredAccessKey, KEY_TOKEN_PREFIX};
pub use namespaces::ProjectStore;
pub use permissions::{apply_grant, remove_grant, PermissionStore};
pub use secrets::{RunnerSecretConfig, RunnerSecretStore, WELL_KNOWN_RUNNER_KEYS};
