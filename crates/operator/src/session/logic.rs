// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure reconcile decisions, separated from cluster I/O so the state
//! machine is testable without an apiserver.

use ambient_cluster::AgenticSession;
use ambient_core::session::{ReconciledRepo, SessionPhase, SessionStatus};
use ambient_providers::{resolve_working_branch, BranchInput};
use chrono::{DateTime, Utc};
use kube::Resource;

pub use ambient_cluster::{RESTART_REQUESTED_ANNOTATION, STOP_REQUESTED_ANNOTATION};

/// Summary of a runner job's state, extracted from its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Active,
    Succeeded,
    Failed,
}

/// Interpret a Job status into the session phase it implies.
pub fn phase_from_job(status: Option<&k8s_openapi::api::batch::v1::JobStatus>) -> Option<JobState> {
    let status = status?;
    if status.succeeded.unwrap_or(0) > 0 {
        return Some(JobState::Succeeded);
    }
    if status.failed.unwrap_or(0) > 0 {
        return Some(JobState::Failed);
    }
    if status.active.unwrap_or(0) > 0 {
        return Some(JobState::Active);
    }
    None
}

impl JobState {
    pub fn session_phase(self) -> SessionPhase {
        match self {
            JobState::Active => SessionPhase::Running,
            JobState::Succeeded => SessionPhase::Completed,
            JobState::Failed => SessionPhase::Failed,
        }
    }
}

/// Whether the session's wall-clock budget is exhausted.
pub fn timeout_exceeded(status: &SessionStatus, timeout_secs: u64, now: DateTime<Utc>) -> bool {
    match status.start_time {
        Some(start) => (now - start).num_seconds() >= timeout_secs as i64,
        None => false,
    }
}

/// Resolve every declared repo's effective working branch. Happens at
/// admission so clients see the final branch before execution.
pub fn resolve_repos(session: &AgenticSession, now: DateTime<Utc>) -> Vec<ReconciledRepo> {
    let name = session.meta().name.clone().unwrap_or_default();
    let display_name =
        session.spec.display_name.clone().unwrap_or_else(|| session.spec.prompt.clone());
    session
        .spec
        .repos
        .iter()
        .map(|repo| {
            let branch = resolve_working_branch(&BranchInput {
                working_branch: repo.input.working_branch.as_deref(),
                allow_protected_work: repo.input.allow_protected_work,
                session_id: &name,
                session_display_name: &display_name,
            });
            ReconciledRepo { url: repo.input.url.clone(), branch, cloned_at: Some(now) }
        })
        .collect()
}

fn annotation_set(session: &AgenticSession, key: &str) -> bool {
    session
        .meta()
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
        .map(|v| v == "true")
        .unwrap_or(false)
}

/// Whether the gateway requested a stop.
pub fn stop_requested(session: &AgenticSession) -> bool {
    annotation_set(session, STOP_REQUESTED_ANNOTATION)
}

/// Whether the gateway requested a restart.
pub fn restart_requested(session: &AgenticSession) -> bool {
    annotation_set(session, RESTART_REQUESTED_ANNOTATION)
}

/// Whether a content sidecar has outlived its TTL annotation.
pub fn content_pod_expired(
    created_at: Option<DateTime<Utc>>,
    ttl_secs: Option<u64>,
    now: DateTime<Utc>,
) -> bool {
    match (created_at, ttl_secs) {
        (Some(created), Some(ttl)) => (now - created).num_seconds() >= ttl as i64,
        _ => false,
    }
}

#[cfg(test)]
#[path = "logic_tests.rs"]
mod tests;
