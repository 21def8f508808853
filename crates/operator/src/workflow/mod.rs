// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow orchestrator.
//!
//! RFE workflows: seeding of the umbrella repo, phase fan-out into
//! sessions sharing the workflow branch and workspace path. BugFix
//! workflows: issue anchoring, branch preparation, typed-session side
//! effects, and idempotent Jira mirroring. Gateway handlers request
//! operations through annotations; this controller performs them and
//! records the outcome in status, so the phase field has a single writer.

pub mod bugfix;
pub mod rfe;

use crate::backoff::Backoff;
use ambient_cluster::{AgenticSession, BugFixWorkflow, RfeWorkflow};
use ambient_core::SystemClock;
use futures_util::StreamExt;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub use ambient_cluster::{
    ADVANCE_AGENTS_ANNOTATION, AUTO_PUSH_ANNOTATION, EFFECTS_APPLIED_ANNOTATION,
    PUBLISH_JIRA_ANNOTATION, SEED_REQUESTED_ANNOTATION, SESSION_TYPE_LABEL,
    SYNC_JIRA_ANNOTATION, WORKFLOW_LABEL,
};

/// Window within which an unforced sync-jira is a no-op.
pub const JIRA_SYNC_WINDOW_SECS: i64 = 60;

/// Orchestrator failure.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("kube api: {0}")]
    Kube(#[from] kube::Error),
    #[error("provider: {0}")]
    Provider(#[from] ambient_providers::ProviderError),
    #[error("cluster: {0}")]
    Cluster(#[from] ambient_cluster::ClusterError),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Shared orchestrator context.
pub struct Ctx {
    pub client: Client,
    pub http: reqwest::Client,
    pub clock: SystemClock,
    pub backoff: Backoff,
}

fn error_policy<K>(_obj: Arc<K>, error: &OrchestratorError, ctx: Arc<Ctx>) -> Action {
    let transient = matches!(
        error,
        OrchestratorError::Kube(kube::Error::Api(ae)) if ae.code == 409 || ae.code >= 500
    );
    if transient {
        Action::requeue(ctx.backoff.delay(1))
    } else {
        Action::requeue(Duration::from_secs(300))
    }
}

/// Run the RFE workflow controller until cancelled.
pub async fn run_rfe(client: Client, http: reqwest::Client, cancel: CancellationToken) {
    let workflows: Api<RfeWorkflow> = Api::all(client.clone());
    let ctx = Arc::new(Ctx {
        client,
        http,
        clock: SystemClock,
        backoff: Backoff::cluster_default(),
    });
    Controller::new(workflows, watcher::Config::default())
        .graceful_shutdown_on(async move { cancel.cancelled().await })
        .run(rfe::reconcile, error_policy, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                warn!(error = %e, "rfe reconcile failed");
            }
        })
        .await;
}

/// Run the BugFix workflow controller until cancelled. Session events
/// re-trigger the owning workflow so completion side effects apply
/// promptly.
pub async fn run_bugfix(client: Client, http: reqwest::Client, cancel: CancellationToken) {
    let workflows: Api<BugFixWorkflow> = Api::all(client.clone());
    let sessions: Api<AgenticSession> = Api::all(client.clone());
    let ctx = Arc::new(Ctx {
        client,
        http,
        clock: SystemClock,
        backoff: Backoff::cluster_default(),
    });
    Controller::new(workflows, watcher::Config::default())
        .watches(sessions, watcher::Config::default(), |session| {
            use kube::ResourceExt;
            let namespace = session.namespace();
            session
                .labels()
                .get(WORKFLOW_LABEL)
                .map(|wf| kube::runtime::reflector::ObjectRef::new(wf).within(&namespace.unwrap_or_default()))
                .into_iter()
                .collect::<Vec<_>>()
        })
        .graceful_shutdown_on(async move { cancel.cancelled().await })
        .run(bugfix::reconcile, error_policy, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                warn!(error = %e, "bugfix reconcile failed");
            }
        })
        .await;
}

/// Read a workflow-side git token from the project's runner secret.
pub(crate) async fn project_git_token(
    client: &Client,
    namespace: &str,
) -> Result<Option<String>, OrchestratorError> {
    let store = ambient_cluster::RunnerSecretStore::new(client.clone(), namespace);
    let values = store.values().await?;
    Ok(values.get("GIT_TOKEN").cloned())
}

/// Jira configuration from the project's runner secret, if complete.
pub(crate) async fn project_jira_config(
    client: &Client,
    namespace: &str,
) -> Result<Option<ambient_providers::JiraConfig>, OrchestratorError> {
    let store = ambient_cluster::RunnerSecretStore::new(client.clone(), namespace);
    let values = store.values().await?;
    let (Some(url), Some(project), Some(email), Some(token)) = (
        values.get("JIRA_URL"),
        values.get("JIRA_PROJECT"),
        values.get("JIRA_EMAIL"),
        values.get("JIRA_API_TOKEN"),
    ) else {
        return Ok(None);
    };
    Ok(Some(ambient_providers::JiraConfig {
        url: url.clone(),
        project: project.clone(),
        email: email.clone(),
        api_token: token.clone(),
    }))
}
