// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session endpoints: CRUD, lifecycle actions, and the content sidecar.
//!
//! Phase is owned by the operator; lifecycle actions communicate through
//! annotations and the operator performs the transition.

use crate::dto::{
    CreateSessionRequest, DisplayNameRequest, Items, SessionView, StatusUpdateRequest,
};
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::workloads::{self, DEFAULT_CONTENT_TTL_SECS};
use ambient_cluster::{AgenticSession, Identity, RESTART_REQUESTED_ANNOTATION, STOP_REQUESTED_ANNOTATION};
use ambient_core::naming::random_suffix;
use ambient_core::session::{SessionPhase, UserContext};
use ambient_core::{session_name, Operation};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use k8s_openapi::api::batch::v1::Job;
use kube::Resource;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, ResourceExt};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/agentic-sessions", get(list).post(create))
        .route(
            "/api/projects/:project/agentic-sessions/:session",
            get(get_one).put(update).delete(delete),
        )
        .route("/api/projects/:project/agentic-sessions/:session/start", post(start))
        .route("/api/projects/:project/agentic-sessions/:session/stop", post(stop))
        .route("/api/projects/:project/agentic-sessions/:session/clone", post(clone_session))
        .route("/api/projects/:project/agentic-sessions/:session/status", put(put_status))
        .route(
            "/api/projects/:project/agentic-sessions/:session/displayname",
            put(put_display_name),
        )
        .route(
            "/api/projects/:project/agentic-sessions/:session/k8s-resources",
            get(k8s_resources),
        )
        .route(
            "/api/projects/:project/agentic-sessions/:session/content-pod",
            post(create_content_pod).get(get_content_pod).delete(delete_content_pod),
        )
}

fn view(project: &str, session: &AgenticSession) -> SessionView {
    SessionView {
        name: session.name_any(),
        project: project.to_string(),
        spec: session.spec.0.clone(),
        status: session.status.clone(),
        creation_timestamp: session
            .meta()
            .creation_timestamp
            .as_ref()
            .map(|t| chrono::DateTime::from(t.0)),
    }
}

fn sessions_api(client: &kube::Client, project: &str) -> Api<AgenticSession> {
    Api::namespaced(client.clone(), project)
}

async fn fetch(
    api: &Api<AgenticSession>,
    name: &str,
) -> Result<AgenticSession, GatewayError> {
    api.get(name).await.map_err(|e| match e {
        kube::Error::Api(ref ae) if ae.code == 404 => {
            GatewayError::not_found(format!("session {name:?} not found"))
        }
        other => other.into(),
    })
}

async fn list(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<SessionView>>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let api = sessions_api(&client, &ctx.name);
    let sessions = api.list(&ListParams::default()).await?;
    Ok(Json(Items::new(sessions.items.iter().map(|s| view(&ctx.name, s)).collect())))
}

async fn create(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let mut spec = body.spec;
    if spec.prompt.trim().is_empty() {
        return Err(GatewayError::validation("prompt is required"));
    }
    if let Some(idx) = spec.main_repo_index {
        if idx >= spec.repos.len() {
            return Err(GatewayError::new(
                ambient_core::ErrorKind::SemanticValidation,
                format!("mainRepoIndex {idx} out of range for {} repos", spec.repos.len()),
            ));
        }
    }

    // The requesting identity is captured on the spec for the runner.
    if spec.user_context.is_none() && !identity.user_id.is_empty() {
        spec.user_context = Some(UserContext {
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            groups: identity.groups.clone(),
        });
    }

    let name = match body.name {
        Some(name) => name,
        None => {
            let basis = spec.display_name.clone().unwrap_or_else(|| spec.prompt.clone());
            session_name(&basis, &random_suffix(5))
        }
    };

    let session = AgenticSession::new(&name, spec.into());
    let api = sessions_api(&client, &ctx.name);
    let created = api.create(&PostParams::default(), &session).await.map_err(|e| match e {
        kube::Error::Api(ref ae) if ae.code == 409 => {
            GatewayError::conflict(format!("session {name:?} already exists"))
        }
        other => other.into(),
    })?;
    Ok((StatusCode::CREATED, Json(view(&ctx.name, &created))))
}

async fn get_one(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<Json<SessionView>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let api = sessions_api(&client, &ctx.name);
    Ok(Json(view(&ctx.name, &fetch(&api, &session).await?)))
}

async fn update(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let api = sessions_api(&client, &ctx.name);
    let patch = serde_json::json!({ "spec": body.spec });
    let updated =
        api.patch(&session, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(Json(view(&ctx.name, &updated)))
}

async fn delete(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsDelete)?;
    cancel_streams(&state, &ctx.name, &session);
    let api = sessions_api(&client, &ctx.name);
    match api.delete(&session, &DeleteParams::default()).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        // Deleting a missing session is success.
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

/// Start doubles as restart: terminal sessions are re-entered via the
/// restart annotation; a session still being created is rejected.
async fn start(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<Json<SessionView>, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let api = sessions_api(&client, &ctx.name);
    let current = fetch(&api, &session).await?;
    let phase = current.status.as_ref().map(|s| s.phase).unwrap_or_default();

    match phase {
        SessionPhase::Creating => Err(GatewayError::precondition_failed(
            "session is still being created; wait for it to settle before restarting",
        )),
        phase if phase.is_terminal() => {
            let patch = serde_json::json!({
                "metadata": { "annotations": {
                    RESTART_REQUESTED_ANNOTATION: "true"
                }}
            });
            let updated =
                api.patch(&session, &PatchParams::default(), &Patch::Merge(&patch)).await?;
            Ok(Json(view(&ctx.name, &updated)))
        }
        // Pending/Running: already on its way.
        _ => Ok(Json(view(&ctx.name, &current))),
    }
}

/// Close all live streams for the session with a terminal cancellation
/// event (spec: code `cancelled`).
fn cancel_streams(state: &AppState, project: &str, session: &str) {
    use ambient_events::{AgEvent, AgEventKind, ThreadId, CODE_CANCELLED};
    let log = state.session_log(project, session);
    let thread = ThreadId::new(session);
    let runs = log.runs_for_thread(&thread).unwrap_or_default();
    let now = ambient_core::Clock::epoch_ms(&state.clock) as i64;
    for run in runs {
        // Runs that already closed keep their single terminal event.
        let already_terminal = log
            .read_all(&thread, &run)
            .map(|events| events.iter().any(|e| e.is_terminal()))
            .unwrap_or(false);
        if already_terminal {
            state.bus.close(&thread, &run);
            continue;
        }
        let mut event = AgEvent::new(
            thread.clone(),
            run.clone(),
            now,
            AgEventKind::RunError {
                error: "session stopped".to_string(),
                code: Some(CODE_CANCELLED.to_string()),
                details: None,
            },
        );
        if let Ok(seq) = log.append(event.clone()) {
            event.seq = Some(seq);
            state.bus.publish(&event);
        }
        state.bus.close(&thread, &run);
    }
}

async fn stop(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let api = sessions_api(&client, &ctx.name);
    let patch = serde_json::json!({
        "metadata": { "annotations": { STOP_REQUESTED_ANNOTATION: "true" } }
    });
    match api.patch(&session, &PatchParams::default(), &Patch::Merge(&patch)).await {
        Ok(_) => {
            cancel_streams(&state, &ctx.name, &session);
            Ok(StatusCode::NO_CONTENT)
        }
        // Stopping a missing session is success.
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

async fn clone_session(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<(StatusCode, Json<SessionView>), GatewayError> {
    require_key_role(&identity, Operation::SessionsDuplicate)?;
    let api = sessions_api(&client, &ctx.name);
    let source = fetch(&api, &session).await?;

    let spec = source.spec.0.clone();
    let basis = spec.display_name.clone().unwrap_or_else(|| spec.prompt.clone());
    let name = session_name(&basis, &random_suffix(5));
    let copy = AgenticSession::new(&name, spec.into());
    let created = api.create(&PostParams::default(), &copy).await?;
    Ok((StatusCode::CREATED, Json(view(&ctx.name, &created))))
}

/// Server-side status PUT for operator/runner use: result fields only.
/// Still a mutation, so read-only access keys are rejected up front.
async fn put_status(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let api = sessions_api(&client, &ctx.name);
    let mut status = serde_json::Map::new();
    if let Some(sdk) = body.sdk_session_id {
        status.insert("sdkSessionId".into(), serde_json::json!(sdk));
    }
    if let Some(result) = body.result {
        status.insert("result".into(), serde_json::json!(result));
    }
    if let Some(summary) = body.result_summary {
        status.insert("resultSummary".into(), serde_json::json!(summary));
    }
    if status.is_empty() {
        return Err(GatewayError::validation("no status fields to update"));
    }
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&session, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_display_name(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
    Json(body): Json<DisplayNameRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let api = sessions_api(&client, &ctx.name);
    let patch = serde_json::json!({ "spec": { "displayName": body.display_name } });
    api.patch(&session, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn k8s_resources(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let selector = format!("{}={session}", workloads::SESSION_LABEL);
    let params = ListParams::default().labels(&selector);

    let jobs: Api<Job> = Api::namespaced(client.clone(), &ctx.name);
    let pods: Api<Pod> = Api::namespaced(client.clone(), &ctx.name);

    let job_items: Vec<serde_json::Value> = jobs
        .list(&params)
        .await?
        .items
        .into_iter()
        .map(|j| {
            serde_json::json!({
                "name": j.name_any(),
                "active": j.status.as_ref().and_then(|s| s.active).unwrap_or(0),
                "succeeded": j.status.as_ref().and_then(|s| s.succeeded).unwrap_or(0),
                "failed": j.status.as_ref().and_then(|s| s.failed).unwrap_or(0),
            })
        })
        .collect();
    let pod_items: Vec<serde_json::Value> = pods
        .list(&params)
        .await?
        .items
        .into_iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name_any(),
                "phase": p.status.as_ref().and_then(|s| s.phase.clone()),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "jobs": job_items, "pods": pod_items })))
}

/// Create-if-absent: an existing sidecar is returned as-is.
async fn create_content_pod(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let api = sessions_api(&client, &ctx.name);
    let current = fetch(&api, &session).await?;

    let pods: Api<Pod> = Api::namespaced(client.clone(), &ctx.name);
    let services: Api<Service> = Api::namespaced(client.clone(), &ctx.name);
    let pod = workloads::build_content_pod(&current, DEFAULT_CONTENT_TTL_SECS);
    let service = workloads::build_content_service(&current);
    let pod_name = pod.metadata.name.clone().unwrap_or_default();

    let created = match pods.create(&PostParams::default(), &pod).await {
        Ok(created) => (StatusCode::CREATED, created),
        Err(kube::Error::Api(ae)) if ae.code == 409 => (StatusCode::OK, pods.get(&pod_name).await?),
        Err(e) => return Err(e.into()),
    };
    match services.create(&PostParams::default(), &service).await {
        Ok(_) => {}
        Err(kube::Error::Api(ae)) if ae.code == 409 => {}
        Err(e) => return Err(e.into()),
    }
    Ok((created.0, Json(pod_summary(&created.1))))
}

fn pod_summary(pod: &Pod) -> serde_json::Value {
    serde_json::json!({
        "name": pod.name_any(),
        "phase": pod.status.as_ref().and_then(|s| s.phase.clone()),
        "ready": pod
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
            .unwrap_or(false),
    })
}

async fn get_content_pod(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let pods: Api<Pod> = Api::namespaced(client, &ctx.name);
    match pods.get(&ambient_core::content_pod_name(&session)).await {
        Ok(pod) => Ok(Json(pod_summary(&pod))),
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            Err(GatewayError::not_found("no content pod for this session"))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_content_pod(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, session)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let pods: Api<Pod> = Api::namespaced(client.clone(), &ctx.name);
    let services: Api<Service> = Api::namespaced(client, &ctx.name);
    let name = ambient_core::content_pod_name(&session);
    for result in [
        pods.delete(&name, &DeleteParams::default()).await.map(|_| ()),
        services.delete(&name, &DeleteParams::default()).await.map(|_| ()),
    ] {
        match result {
            Ok(()) => {}
            Err(kube::Error::Api(ae)) if ae.code == 404 => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
