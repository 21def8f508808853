// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BugFix workflow endpoints.

use crate::dto::{CreateBugFixRequest, CreateBugFixSessionRequest, Items, SyncJiraRequest};
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::{
    AgenticSession, BugFixWorkflow, Identity, AUTO_PUSH_ANNOTATION, SESSION_TYPE_LABEL,
    SYNC_JIRA_ANNOTATION, WORKFLOW_LABEL,
};
use ambient_core::naming::{random_suffix, slugify};
use ambient_core::session::{RepoInput, SessionRepo, SessionSpec, UserContext};
use ambient_core::workflow::{BugFixPhase, BugFixSessionType, BugFixWorkflowSpec, GithubIssueRef};
use ambient_core::Operation;
use ambient_providers::parse_issue_url;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, ResourceExt};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/bugfix-workflows", get(list).post(create))
        .route(
            "/api/projects/:project/bugfix-workflows/:id",
            get(get_one).put(update).delete(delete),
        )
        .route("/api/projects/:project/bugfix-workflows/:id/status", get(status))
        .route(
            "/api/projects/:project/bugfix-workflows/:id/sessions",
            get(sessions).post(create_session),
        )
        .route("/api/projects/:project/bugfix-workflows/:id/sync-jira", post(sync_jira))
}

fn api(client: &kube::Client, project: &str) -> Api<BugFixWorkflow> {
    Api::namespaced(client.clone(), project)
}

async fn fetch(api: &Api<BugFixWorkflow>, id: &str) -> Result<BugFixWorkflow, GatewayError> {
    api.get(id).await.map_err(|e| match e {
        kube::Error::Api(ref ae) if ae.code == 404 => {
            GatewayError::not_found(format!("bugfix workflow {id:?} not found"))
        }
        other => other.into(),
    })
}

async fn list(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<BugFixWorkflow>>, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let workflows = api(&client, &ctx.name).list(&ListParams::default()).await?;
    Ok(Json(Items::new(workflows.items)))
}

async fn create(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<CreateBugFixRequest>,
) -> Result<(StatusCode, Json<BugFixWorkflow>), GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;

    // Anchored to an existing issue, or to a description the orchestrator
    // turns into one.
    let (github_issue, title, description) = match body.github_issue_url {
        Some(ref url) if !url.is_empty() => {
            let (_, number) = parse_issue_url(url)?;
            let title = body.title.unwrap_or_else(|| format!("Bug #{number}"));
            (
                GithubIssueRef { number, url: url.clone() },
                title,
                body.description.unwrap_or_default(),
            )
        }
        _ => {
            let title = body
                .title
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| GatewayError::validation("title or githubIssueUrl is required"))?;
            let description = body.description.unwrap_or_default();
            if description.trim().is_empty() {
                return Err(GatewayError::validation(
                    "description is required when no issue URL is given",
                ));
            }
            (GithubIssueRef::default(), title, description)
        }
    };

    let slug = slugify(&title, 3, 12);
    let id = format!("bugfix-{}-{}", if slug.is_empty() { "issue".into() } else { slug.clone() }, random_suffix(5));
    let branch_name = if github_issue.number > 0 {
        format!("bugfix-{}-{}", slug, github_issue.number)
    } else {
        format!("bugfix-{slug}")
    };

    let spec = BugFixWorkflowSpec {
        github_issue,
        title,
        description,
        branch_name,
        implementation_repo: body.implementation_repo,
        created_by: identity.user_id.clone(),
    };
    let workflow = BugFixWorkflow::new(&id, spec.into());
    let created = api(&client, &ctx.name).create(&PostParams::default(), &workflow).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<BugFixWorkflow>, GatewayError> {
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

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBugFixRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

async fn update(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<UpdateBugFixRequest>,
) -> Result<Json<BugFixWorkflow>, GatewayError> {
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

async fn sessions(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Items<serde_json::Value>>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let sessions: Api<AgenticSession> = Api::namespaced(client, &ctx.name);
    let selector = format!("{WORKFLOW_LABEL}={id}");
    let list = sessions.list(&ListParams::default().labels(&selector)).await?;
    let items = list
        .items
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name_any(),
                "sessionType": s.labels().get(SESSION_TYPE_LABEL),
                "phase": s.status.as_ref().map(|st| st.phase),
            })
        })
        .collect();
    Ok(Json(Items::new(items)))
}

fn session_prompt(
    session_type: BugFixSessionType,
    workflow: &BugFixWorkflow,
    custom: Option<String>,
) -> String {
    if let Some(prompt) = custom.filter(|p| !p.trim().is_empty()) {
        return prompt;
    }
    let issue = &workflow.spec.github_issue.url;
    match session_type {
        BugFixSessionType::BugReview => format!(
            "Investigate the root cause of the bug tracked at {issue}. Reproduce it, \
             identify the faulty code path, and write up your findings."
        ),
        BugFixSessionType::BugResolutionPlan => format!(
            "Propose a fix plan for the bug tracked at {issue}, based on the review \
             findings in the workspace."
        ),
        BugFixSessionType::BugImplementFix => format!(
            "Implement and commit the fix for the bug tracked at {issue} on branch {}. \
             Push the branch when the fix is complete and tested.",
            workflow.spec.branch_name
        ),
        BugFixSessionType::Generic => {
            format!("Work on the bug tracked at {issue} as directed in the workspace.")
        }
    }
}

async fn create_session(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<CreateBugFixSessionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let workflow = fetch(&api(&client, &ctx.name), &id).await?;
    let phase = workflow.status.as_ref().map(|s| s.phase).unwrap_or_default();
    if phase != BugFixPhase::Ready {
        return Err(GatewayError::precondition_failed(
            "workflow is still initializing; retry once it is Ready",
        ));
    }

    let spec = SessionSpec {
        prompt: session_prompt(body.session_type, &workflow, body.prompt),
        display_name: Some(format!("{} — {}", workflow.spec.title, body.session_type)),
        user_context: if identity.user_id.is_empty() {
            None
        } else {
            Some(UserContext {
                user_id: identity.user_id.clone(),
                display_name: identity.display_name.clone(),
                groups: identity.groups.clone(),
            })
        },
        repos: vec![SessionRepo {
            input: RepoInput {
                url: workflow.spec.implementation_repo.url.clone(),
                branch: workflow.spec.implementation_repo.branch.clone(),
                working_branch: Some(workflow.spec.branch_name.clone()),
                allow_protected_work: true,
                sync: None,
            },
            output: None,
            status: None,
        }],
        ..Default::default()
    };

    let name = format!("{id}-{}-{}", body.session_type, random_suffix(5));
    let mut session = AgenticSession::new(&name, spec.into());
    let labels = session.metadata.labels.get_or_insert_with(Default::default);
    labels.insert(WORKFLOW_LABEL.to_string(), id.clone());
    labels.insert(SESSION_TYPE_LABEL.to_string(), body.session_type.to_string());
    if body.auto_push_on_complete {
        session
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(AUTO_PUSH_ANNOTATION.to_string(), "true".to_string());
    }

    let sessions: Api<AgenticSession> = Api::namespaced(client, &ctx.name);
    let created = sessions.create(&PostParams::default(), &session).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "name": created.name_any(),
            "sessionType": body.session_type,
        })),
    ))
}

async fn sync_jira(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, id)): Path<(String, String)>,
    Json(body): Json<SyncJiraRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::WorkflowsManage)?;
    let value = if body.force { "force" } else { "true" };
    let patch =
        serde_json::json!({ "metadata": { "annotations": { SYNC_JIRA_ANNOTATION: value } } });
    api(&client, &ctx.name).patch(&id, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(StatusCode::ACCEPTED)
}
