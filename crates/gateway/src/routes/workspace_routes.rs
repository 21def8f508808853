// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace browsing and editing for a session.

use crate::dto::Items;
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use crate::workspace;
use ambient_cluster::Identity;
use ambient_core::Operation;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/agentic-sessions/:session/workspace", get(list_root))
        .route(
            "/api/projects/:project/agentic-sessions/:session/workspace/*path",
            get(read).put(write),
        )
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    path: String,
}

async fn list_root(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Items<crate::content::ContentEntry>>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let root = state.workspace_root(&ctx.name, &session);
    Ok(Json(Items::new(workspace::list_dir(&root, &query.path)?)))
}

async fn read(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session, path)): Path<(String, String, String)>,
) -> Result<Vec<u8>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let root = state.workspace_root(&ctx.name, &session);
    workspace::read_file(&root, &path)
}

async fn write(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session, path)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let root = state.workspace_root(&ctx.name, &session);
    workspace::write_file(&root, &path, &body)?;
    Ok(StatusCode::NO_CONTENT)
}
