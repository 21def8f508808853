// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git provider passthrough and GitHub App connection management.
//!
//! Token resolution order for provider calls: the caller's linked GitHub
//! App installation (minted on demand), else unauthenticated (public
//! repos only). Tokens never outlive the request.

use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::{Identity, InstallationStore};
use ambient_core::Operation;
use ambient_providers::{
    is_protected, GitProvider, GithubClient, GitlabClient, InstallationRecord, NewPullRequest,
    Provider, RepoRef,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/repo/tree", get(tree))
        .route("/api/projects/:project/repo/blob", get(blob))
        .route("/api/projects/:project/repo/branches", get(branches))
        .route("/api/projects/:project/users/forks", get(list_forks).post(create_fork))
        .route("/api/projects/:project/github/pr", post(create_pr))
        .route("/api/projects/:project/github/diff", get(diff))
        .route("/api/projects/:project/github/push", post(push))
        .route("/api/projects/:project/github/abandon", post(abandon))
        .route("/api/projects/:project/auth/github/status", get(github_status))
        .route("/api/projects/:project/auth/github/install", post(github_install))
        .route(
            "/api/projects/:project/auth/github/disconnect",
            axum::routing::delete(github_disconnect),
        )
        .route("/api/projects/:project/auth/github/user/callback", get(github_callback))
}

/// Resolve a provider token for the caller: their linked installation,
/// minted against the repo's host.
async fn caller_token(
    state: &AppState,
    client: &kube::Client,
    project: &str,
    identity: &Identity,
    repo: &RepoRef,
) -> Result<Option<String>, GatewayError> {
    if repo.provider != Provider::Github {
        return Ok(None);
    }
    let Some(ref tokens) = state.tokens else {
        return Ok(None);
    };
    let store = InstallationStore::new(client.clone(), project);
    let Some(record) = store.get_installation(&identity.user_id).await? else {
        return Ok(None);
    };
    let host = record.host.clone().unwrap_or_else(|| repo.host.clone());
    let token = tokens.mint_installation_token_for_host(record.installation_id, &host).await?;
    Ok(Some(token))
}

fn provider_for(
    state: &AppState,
    repo: &RepoRef,
    token: Option<String>,
) -> Box<dyn GitProvider + Send + Sync> {
    match repo.provider {
        Provider::Github => Box::new(GithubClient::new(state.http.clone(), token)),
        Provider::Gitlab => Box::new(GitlabClient::new(state.http.clone(), token)),
    }
}

async fn adapter(
    state: &AppState,
    client: &kube::Client,
    project: &str,
    identity: &Identity,
    repo_url: &str,
) -> Result<(RepoRef, Box<dyn GitProvider + Send + Sync>), GatewayError> {
    let repo = RepoRef::parse(repo_url)?;
    let token = caller_token(state, client, project, identity, &repo).await?;
    let provider = provider_for(state, &repo, token);
    Ok((repo, provider))
}

#[derive(Debug, Deserialize)]
struct RepoQuery {
    repo: String,
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

async fn tree(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &query.repo).await?;
    let git_ref = query.git_ref.as_deref().unwrap_or("HEAD");
    let entries =
        provider.get_tree(&repo, git_ref, query.path.as_deref().unwrap_or("")).await?;
    Ok(Json(serde_json::json!({ "items": entries })))
}

async fn blob(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let path = query
        .path
        .as_deref()
        .ok_or_else(|| GatewayError::validation("path is required"))?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &query.repo).await?;
    let blob = provider.get_blob(&repo, query.git_ref.as_deref().unwrap_or("HEAD"), path).await?;
    Ok(Json(serde_json::to_value(blob).unwrap_or_default()))
}

async fn branches(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &query.repo).await?;
    let branches = provider.list_branches(&repo).await?;
    Ok(Json(serde_json::json!({ "items": branches })))
}

async fn list_forks(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &query.repo).await?;
    let forks = provider.list_user_forks(&repo).await?;
    Ok(Json(serde_json::json!({ "items": forks })))
}

#[derive(Debug, Deserialize)]
struct ForkRequest {
    repo: String,
}

async fn create_fork(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<ForkRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &body.repo).await?;
    let fork = provider.create_fork(&repo).await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(fork).unwrap_or_default())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrRequest {
    repo: String,
    title: String,
    #[serde(default)]
    body: String,
    head: String,
    base: String,
    #[serde(default)]
    draft: bool,
}

async fn create_pr(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<PrRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &body.repo).await?;
    let pr = provider
        .create_pull_request(
            &repo,
            &NewPullRequest {
                title: body.title,
                body: body.body,
                head: body.head,
                base: body.base,
                draft: body.draft,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(pr).unwrap_or_default())))
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    repo: String,
    base: String,
    head: String,
}

async fn diff(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &query.repo).await?;
    let compared = provider.compare(&repo, &query.base, &query.head).await?;
    Ok(Json(serde_json::to_value(compared).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest {
    repo: String,
    /// Working branch the runner pushed.
    head: String,
    base: String,
    #[serde(default)]
    title: Option<String>,
}

/// "Push" at the control-plane level: the runner has already pushed the
/// working branch; this opens the PR that lands it.
async fn push(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<PushRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &body.repo).await?;
    let title = body.title.unwrap_or_else(|| format!("Changes from {}", body.head));
    let pr = provider
        .create_pull_request(
            &repo,
            &NewPullRequest {
                title,
                body: String::new(),
                head: body.head,
                base: body.base,
                draft: false,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(pr).unwrap_or_default())))
}

#[derive(Debug, Deserialize)]
struct AbandonRequest {
    repo: String,
    branch: String,
}

/// Abandon a working branch: delete it from the remote. Protected
/// branches are never deleted, regardless of caller permissions.
async fn abandon(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<AbandonRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    if is_protected(&body.branch) {
        return Err(GatewayError::forbidden(format!(
            "{:?} is a protected branch and cannot be abandoned",
            body.branch
        )));
    }
    let (repo, provider) = adapter(&state, &client, &ctx.name, &identity, &body.repo).await?;
    provider.delete_branch(&repo, &body.branch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn github_status(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let store = InstallationStore::new(client, &ctx.name);
    let record = store.get_installation(&identity.user_id).await?;
    Ok(Json(serde_json::json!({
        "connected": record.is_some(),
        "installation": record,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallRequest {
    installation_id: u64,
    #[serde(default)]
    host: Option<String>,
}

async fn github_install(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<InstallRequest>,
) -> Result<StatusCode, GatewayError> {
    if identity.user_id.is_empty() {
        return Err(GatewayError::validation("installation links require a user identity"));
    }
    let store = InstallationStore::new(client, &ctx.name);
    store
        .set_installation(&InstallationRecord {
            user_id: identity.user_id.clone(),
            installation_id: body.installation_id,
            host: body.host,
            connected_at: Some(ambient_core::Clock::now_utc(&state.clock)),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn github_disconnect(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<StatusCode, GatewayError> {
    let store = InstallationStore::new(client, &ctx.name);
    store.remove_installation(&identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    installation_id: u64,
}

/// OAuth post-install callback: records the installation for the caller.
async fn github_callback(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let store = InstallationStore::new(client, &ctx.name);
    store
        .set_installation(&InstallationRecord {
            user_id: identity.user_id.clone(),
            installation_id: query.installation_id,
            host: state.tokens.as_ref().map(|t| t.default_host().to_string()),
            connected_at: Some(ambient_core::Clock::now_utc(&state.clock)),
        })
        .await?;
    Ok(Json(serde_json::json!({ "connected": true })))
}
