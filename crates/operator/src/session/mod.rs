// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session reconciler.
//!
//! Drives each AgenticSession to match its spec: workspace volume,
//! runner job, optional content sidecar, and the phase state machine.
//! Job events propagate back through owner references, so the controller
//! re-reconciles on every job change plus a periodic resync.

pub mod logic;

use crate::backoff::Backoff;
use crate::env;
use ambient_cluster::workloads;
use ambient_cluster::{AgenticSession, ProjectSettings, PROJECT_SETTINGS_NAME};
use ambient_core::session::{SessionPhase, SessionStatus};
use ambient_core::{Clock, SystemClock};
use futures_util::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use kube::api::{DeleteParams, Patch, PatchParams, PostParams, PropagationPolicy};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, Resource, ResourceExt};
use logic::{JobState, RESTART_REQUESTED_ANNOTATION, STOP_REQUESTED_ANNOTATION};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reconcile failure. Only transient cluster errors requeue with backoff;
/// everything else is recorded as a condition and waits for a new event.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("kube api: {0}")]
    Kube(#[from] kube::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shared controller context.
pub struct Ctx {
    pub client: Client,
    pub clock: SystemClock,
    pub backoff: Backoff,
}

/// Run the session controller until cancelled.
pub async fn run(client: Client, cancel: CancellationToken) {
    let sessions: Api<AgenticSession> = Api::all(client.clone());
    let jobs: Api<Job> = Api::all(client.clone());
    let ctx = Arc::new(Ctx {
        client,
        clock: SystemClock,
        backoff: Backoff::cluster_default(),
    });

    Controller::new(sessions, watcher::Config::default())
        .owns(jobs, watcher::Config::default())
        .graceful_shutdown_on(async move { cancel.cancelled().await })
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => tracing::debug!(session = %obj.name, "reconciled"),
                Err(e) => warn!(error = %e, "reconcile failed"),
            }
        })
        .await;
}

fn error_policy(_session: Arc<AgenticSession>, error: &ReconcileError, ctx: Arc<Ctx>) -> Action {
    let transient = matches!(
        error,
        ReconcileError::Kube(kube::Error::Api(ae)) if ae.code == 409 || ae.code >= 500
    ) || matches!(error, ReconcileError::Kube(kube::Error::Service(_)));
    if transient {
        Action::requeue(ctx.backoff.delay(1))
    } else {
        Action::requeue(Duration::from_secs(120))
    }
}

struct SessionApis {
    sessions: Api<AgenticSession>,
    jobs: Api<Job>,
    pvcs: Api<PersistentVolumeClaim>,
    pods: Api<Pod>,
    services: Api<Service>,
    settings: Api<ProjectSettings>,
}

impl SessionApis {
    fn new(client: &Client, namespace: &str) -> Self {
        Self {
            sessions: Api::namespaced(client.clone(), namespace),
            jobs: Api::namespaced(client.clone(), namespace),
            pvcs: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client.clone(), namespace),
            services: Api::namespaced(client.clone(), namespace),
            settings: Api::namespaced(client.clone(), namespace),
        }
    }
}

async fn reconcile(
    session: Arc<AgenticSession>,
    ctx: Arc<Ctx>,
) -> Result<Action, ReconcileError> {
    let name = session.name_any();
    let Some(namespace) = session.meta().namespace.clone() else {
        return Ok(Action::await_change());
    };
    if session.meta().deletion_timestamp.is_some() {
        // Owner references cascade to the job, pods, volume, and sidecar.
        return Ok(Action::await_change());
    }

    let apis = SessionApis::new(&ctx.client, &namespace);
    let now = ctx.clock.now_utc();
    let mut status = session.status.clone().unwrap_or_default();
    status.observed_generation = session.meta().generation;

    if logic::stop_requested(&session) {
        return handle_stop(&apis, &name, &mut status, &ctx, now).await;
    }
    if logic::restart_requested(&session) {
        return handle_restart(&apis, &name, &mut status, &ctx).await;
    }

    let action = match status.phase {
        SessionPhase::Pending => {
            ensure_workspace(&apis, &session, &mut status, now).await?;
            status.reconciled_repos = logic::resolve_repos(&session, now);
            status.reconciled_workflow = session.spec.active_workflow.clone();
            if status.transition(SessionPhase::Creating, now) {
                info!(session = %name, "admitted; workspace ensured, branches resolved");
            }
            Action::requeue(Duration::from_secs(2))
        }
        SessionPhase::Creating => {
            ensure_workspace(&apis, &session, &mut status, now).await?;
            ensure_job(&apis, &session, &mut status, now).await?;
            if let Some(job_state) = current_job_state(&apis, &name).await? {
                if job_state == JobState::Active {
                    status.transition(SessionPhase::Running, now);
                }
            }
            Action::requeue(Duration::from_secs(5))
        }
        SessionPhase::Running => reflect_job(&apis, &session, &mut status, now).await?,
        // Terminal phases: nothing to drive; the sidecar reaper still runs.
        _ => Action::requeue(Duration::from_secs(env::resync_secs())),
    };

    reap_expired_content_pod(&apis, &name, now).await?;
    patch_status(&apis.sessions, &name, &status).await?;
    Ok(action)
}

async fn handle_stop(
    apis: &SessionApis,
    name: &str,
    status: &mut SessionStatus,
    ctx: &Ctx,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Action, ReconcileError> {
    if !status.phase.is_terminal() {
        delete_job(apis, name).await?;
        status.transition(SessionPhase::Stopped, now);
        status.set_condition(
            "Stopped",
            "True",
            Some("UserRequested".into()),
            None,
            ctx.clock.now_utc(),
        );
        info!(session = %name, "stopped; workspace volume retained");
    }
    clear_annotation(&apis.sessions, name, STOP_REQUESTED_ANNOTATION).await?;
    patch_status(&apis.sessions, name, status).await?;
    Ok(Action::await_change())
}

async fn handle_restart(
    apis: &SessionApis,
    name: &str,
    status: &mut SessionStatus,
    _ctx: &Ctx,
) -> Result<Action, ReconcileError> {
    if status.restart() {
        // The job is recreated on the next pass; the volume is untouched
        // so the runner resumes from its last committed state.
        delete_job(apis, name).await?;
        info!(session = %name, restart_count = status.restart_count, "restarting");
        patch_status(&apis.sessions, name, status).await?;
    }
    clear_annotation(&apis.sessions, name, RESTART_REQUESTED_ANNOTATION).await?;
    Ok(Action::requeue(Duration::from_secs(1)))
}

async fn ensure_workspace(
    apis: &SessionApis,
    session: &AgenticSession,
    status: &mut SessionStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), ReconcileError> {
    let pvc = workloads::build_workspace_pvc(session);
    let pvc_name = pvc.metadata.name.clone().unwrap_or_default();
    match apis.pvcs.create(&PostParams::default(), &pvc).await {
        Ok(_) => {
            status.set_condition("WorkspaceReady", "True", Some("Created".into()), None, now);
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            status.set_condition("WorkspaceReady", "True", Some("Exists".into()), None, now);
            Ok(())
        }
        Err(e) => {
            status.set_condition(
                "WorkspaceReady",
                "False",
                Some("CreateFailed".into()),
                Some(format!("{pvc_name}: {e}")),
                now,
            );
            Err(e.into())
        }
    }
}

async fn ensure_job(
    apis: &SessionApis,
    session: &AgenticSession,
    status: &mut SessionStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), ReconcileError> {
    let runner_secret = match apis.settings.get(PROJECT_SETTINGS_NAME).await {
        Ok(settings) => settings.spec.runner_secrets_name,
        Err(kube::Error::Api(ae)) if ae.code == 404 => None,
        Err(e) => return Err(e.into()),
    };
    let job = workloads::build_runner_job(session, runner_secret.as_deref());
    match apis.jobs.create(&PostParams::default(), &job).await {
        Ok(_) => {
            status.set_condition("JobCreated", "True", None, None, now);
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => {
            // Quota/admission failures surface as a condition; the error
            // policy decides whether they are retried.
            status.set_condition(
                "JobCreated",
                "False",
                Some("CreateFailed".into()),
                Some(e.to_string()),
                now,
            );
            Err(e.into())
        }
    }
}

async fn current_job_state(
    apis: &SessionApis,
    session_name: &str,
) -> Result<Option<JobState>, ReconcileError> {
    let job_name = ambient_core::job_name(session_name);
    match apis.jobs.get(&job_name).await {
        Ok(job) => Ok(logic::phase_from_job(job.status.as_ref())),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn reflect_job(
    apis: &SessionApis,
    session: &AgenticSession,
    status: &mut SessionStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Action, ReconcileError> {
    let name = session.name_any();

    if logic::timeout_exceeded(status, session.spec.timeout, now) {
        delete_job(apis, &name).await?;
        status.transition(SessionPhase::Failed, now);
        status.set_condition(
            "Completed",
            "False",
            Some("timeout".into()),
            Some(format!("exceeded {}s budget", session.spec.timeout)),
            now,
        );
        warn!(session = %name, timeout = session.spec.timeout, "session timed out");
        return Ok(Action::await_change());
    }

    match current_job_state(apis, &name).await? {
        Some(JobState::Active) | None => Ok(Action::requeue(Duration::from_secs(30))),
        Some(state) => {
            let next = state.session_phase();
            status.transition(next, now);
            let (value, reason) = match state {
                JobState::Succeeded => ("True", "JobSucceeded"),
                _ => ("False", "JobFailed"),
            };
            status.set_condition("Completed", value, Some(reason.into()), None, now);
            info!(session = %name, phase = %next, "job terminated");
            Ok(Action::await_change())
        }
    }
}

async fn delete_job(apis: &SessionApis, session_name: &str) -> Result<(), ReconcileError> {
    let job_name = ambient_core::job_name(session_name);
    let dp = DeleteParams {
        propagation_policy: Some(PropagationPolicy::Background),
        ..Default::default()
    };
    match apis.jobs.delete(&job_name, &dp).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Delete the content sidecar (and service) once its TTL lapses.
async fn reap_expired_content_pod(
    apis: &SessionApis,
    session_name: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), ReconcileError> {
    let pod_name = ambient_core::content_pod_name(session_name);
    let pod = match apis.pods.get(&pod_name).await {
        Ok(p) => p,
        Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let created = pod
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t.0));
    let ttl = pod
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(workloads::CONTENT_TTL_ANNOTATION))
        .and_then(|v| v.parse::<u64>().ok());
    if logic::content_pod_expired(created, ttl, now) {
        info!(pod = %pod_name, "reaping expired content sidecar");
        for result in [
            apis.pods.delete(&pod_name, &DeleteParams::default()).await.map(|_| ()),
            apis.services.delete(&pod_name, &DeleteParams::default()).await.map(|_| ()),
        ] {
            match result {
                Ok(()) => {}
                Err(kube::Error::Api(ae)) if ae.code == 404 => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

async fn patch_status(
    api: &Api<AgenticSession>,
    name: &str,
    status: &SessionStatus,
) -> Result<(), ReconcileError> {
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

async fn clear_annotation(
    api: &Api<AgenticSession>,
    name: &str,
    annotation: &str,
) -> Result<(), ReconcileError> {
    let patch = serde_json::json!({ "metadata": { "annotations": { annotation: null } } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}
