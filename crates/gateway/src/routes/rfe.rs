// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFE workflow endpoints.
//!
//! Seeding, phase advance, and Jira publication are requested through
//! annotations; the orchestrator performs them and records the outcome
//! in status, keeping a single writer for workflow state.

use crate::dto::{AdvancePhaseRequest, Items, PublishJiraRequest};
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::{
    AgenticSession, Identity, RfeWorkflow, ADVANCE_AGENTS_ANNOTATION, PUBLISH_JIRA_ANNOTATION,
    SEED_REQUESTED_ANNOTATION, WORKFLOW_LABEL,
};
use ambient_core::naming::{random_suffix, slugify};
use ambient_core::workflow::RfeWorkflowSpec;
use ambient_core::Operation;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, ResourceExt};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/rfe-workflows", get(list).post(create))
        .route("/api/projects/:project/rfe-workflows/:id", get(get_one).put(update).delete(delete))
        .route("/api/projects/:project/rfe-workflows/:id/status", get(status))
        .route("/api/projects/:project/rfe-workflows/:id/artifacts", get(artifacts))
        .route(
            "/api/projects/:project/rfe-workflows/:id/sessions",
            get(sessions).post(link_session),
        )
        .route(
            "/api/projects/:project/rfe-workflows/:id/sessions/:session",
            axum::routing::delete(unlink_session),
        )
        .route("/api/projects/:project/rfe-workflows/:id/jira", get(jira_links).post(publish_jira))
        .route("/api/projects/:project/rfe-workflows/:id/check-seeding", post(check_seeding))
        .route("/api/projects/:project/rfe-workflows/:id/seed", post(seed))
        .route("/api/projects/:project/rfe-workflows/:id/phase", post(advance_phase))
}

fn api(client: &kube::Client, project: &str) -> Api<RfeWorkflow> {
    Api::namespaced(client.clone(), project)
}

async fn fetch(api: &Api<RfeWorkflow>, id: &str) -> Result<RfeWorkflow, GatewayError> {
    api.get(id).await.map_err(|e| match e {
        kube::Error::Api(ref ae) if ae.code == 404 => {
            GatewayError::not_found(format!("rfe workflow {id:?} not found"))
        }
        other => other.into(),
    })
}

async fn annotate(
    api: &Api<RfeWorkflow>,
    id: &str,
    key: &str,
    value: &str,
) -> Result<(), GatewayError> {
    let patch = serde_json::json!({ "metadata": { "annotations": { key: value } } });
    api.patch(id, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRfeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub umbrella_repo: ambient_core::workflow::WorkflowRepo,
    #[serde(default)]
    pub supporting_repos: Vec<ambient_core::workflow::WorkflowRepo>,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

async fn list(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<RfeWorkflow>>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflows = api(&client, &ctx.name).list(&ListParams::default()).await?;
    Ok(Json(Items::new(workflows.items)))
}

async fn create(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<CreateRfeRequest>,
) -> Result<(StatusCode, Json<RfeWorkflow>), GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    if body.title.trim().is_empty() {
        return Err(GatewayError::validation("title is required"));
    }
    let slug = slugify(&body.title, 3, 12);
    let id = format!("rfe-{}-{}", if slug.is_empty() { "workflow".into() } else { slug.clone() }, random_suffix(5));
    let branch_name = body.branch_name.unwrap_or_else(|| format!("rfe-{slug}"));
    let spec = RfeWorkflowSpec {
        title: body.title,
        description: body.description,
        branch_name,
        umbrella_repo: body.umbrella_repo,
        supporting_repos: body.supporting_repos,
        project: ctx.name.clone(),
        workspace_path: body.workspace_path.unwrap_or_else(|| format!("rfe/{slug}")),
        parent_outcome: None,
    };
    let workflow = RfeWorkflow::new(&id, spec.into());
    let created = api(&client, &ctx.name).create(&PostParams::default(), &workflow).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<RfeWorkflow>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    Ok(Json(fetch(&api(&client, &ctx.name), &id).await?))
}

async fn status(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflow = fetch(&api(&client, &ctx.name), &id).await?;
    Ok(Json(serde_json::json!({ "status": workflow.status })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRfeRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Title/description edits only; the branch, repos, and workspace path
/// are fixed once sessions share them.
async fn update(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<UpdateRfeRequest>,
) -> Result<Json<RfeWorkflow>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let mut spec = serde_json::Map::new();
    if let Some(title) = body.title {
        spec.insert("title".into(), serde_json::json!(title));
    }
    if let Some(description) = body.description {
        spec.insert("description".into(), serde_json::json!(description));
    }
    if spec.is_empty() {
        return Err(GatewayError::validation("nothing to update"));
    }
    let patch = serde_json::json!({ "spec": spec });
    let updated =
        api(&client, &ctx.name).patch(&id, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(Json(updated))
}

async fn delete(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    match api(&client, &ctx.name).delete(&id, &DeleteParams::default()).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

/// Workspace artifacts live on the workflow branch under the workspace
/// path; each linked session's workspace also carries them locally, but
/// the branch is the shared source of truth.
async fn artifacts(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflow = fetch(&api(&client, &ctx.name), &id).await?;
    Ok(Json(serde_json::json!({
        "repo": workflow.spec.umbrella_repo.url,
        "branch": workflow.spec.branch_name,
        "path": workflow.spec.workspace_path,
        "sessionNames": workflow.status.as_ref().map(|s| s.session_names.clone()).unwrap_or_default(),
    })))
}

async fn sessions(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Items<String>>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let sessions: Api<AgenticSession> = Api::namespaced(client, &ctx.name);
    let selector = format!("{WORKFLOW_LABEL}={id}");
    let list = sessions.list(&ListParams::default().labels(&selector)).await?;
    Ok(Json(Items::new(list.items.iter().map(|s| s.name_any()).collect())))
}

#[derive(Debug, Deserialize)]
struct LinkSessionRequest {
    name: String,
}

async fn link_session(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<LinkSessionRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let sessions: Api<AgenticSession> = Api::namespaced(client, &ctx.name);
    let patch = serde_json::json!({ "metadata": { "labels": { WORKFLOW_LABEL: id } } });
    sessions.patch(&body.name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlink_session(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, _id, session)): Path<(String, String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let sessions: Api<AgenticSession> = Api::namespaced(client, &ctx.name);
    let patch = serde_json::json!({ "metadata": { "labels": { WORKFLOW_LABEL: null } } });
    match sessions.patch(&session, &PatchParams::default(), &Patch::Merge(&patch)).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

async fn jira_links(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflow = fetch(&api(&client, &ctx.name), &id).await?;
    let links = workflow.status.as_ref().map(|s| s.jira_links.clone()).unwrap_or_default();
    Ok(Json(serde_json::json!({ "items": links })))
}

async fn publish_jira(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<PublishJiraRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    if body.path.trim().is_empty() {
        return Err(GatewayError::validation("workspace file path is required"));
    }
    annotate(&api(&client, &ctx.name), &id, PUBLISH_JIRA_ANNOTATION, &body.path).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn check_seeding(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflow = fetch(&api(&client, &ctx.name), &id).await?;
    let seeded = workflow.status.as_ref().map(|s| s.seeded).unwrap_or(false);
    Ok(Json(serde_json::json!({ "seeded": seeded })))
}

async fn seed(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    annotate(&api(&client, &ctx.name), &id, SEED_REQUESTED_ANNOTATION, "true").await?;
    Ok(StatusCode::ACCEPTED)
}

async fn advance_phase(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<AdvancePhaseRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    if body.agents.is_empty() {
        return Err(GatewayError::validation("at least one agent is required"));
    }
    annotate(
        &api(&client, &ctx.name),
        &id,
        ADVANCE_AGENTS_ANNOTATION,
        &body.agents.join(","),
    )
    .await?;
    Ok(StatusCode::ACCEPTED)
}
