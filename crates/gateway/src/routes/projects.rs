// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project CRUD.
//!
//! Listing filters to managed namespaces; creation stamps the managed
//! label and display annotations. All calls run under the caller's
//! impersonated client, so RBAC decides who may create or delete.

use crate::dto::{CreateProjectRequest, Items, UpdateProjectRequest};
use crate::error::GatewayError;
use crate::state::AppState;
use ambient_cluster::ProjectStore;
use ambient_core::ProjectMeta;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list).post(create))
        .route("/api/projects/:project", get(get_one).put(update).delete(delete))
}

async fn list(
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<ProjectMeta>>, GatewayError> {
    let store = ProjectStore::new(client);
    Ok(Json(Items::new(store.list().await?)))
}

async fn create(
    Extension(client): Extension<kube::Client>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectMeta>), GatewayError> {
    if body.name.is_empty() {
        return Err(GatewayError::validation("project name is required"));
    }
    let store = ProjectStore::new(client);
    let created = store.create(&body.into_meta()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<ProjectMeta>, GatewayError> {
    // Same managed-label gate the middleware applies to nested paths.
    let store = ProjectStore::new(state.factory.privileged()?);
    match store.get(&project).await? {
        Some(meta) => Ok(Json(meta)),
        None => Err(GatewayError::not_found(format!("project {project:?} not found"))),
    }
}

async fn update(
    Extension(client): Extension<kube::Client>,
    Path(project): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectMeta>, GatewayError> {
    // The store refuses absent or unmanaged namespaces with not-found,
    // so writes carry the same managed-label gate as reads.
    let store = ProjectStore::new(client);
    let meta = ProjectMeta {
        name: project,
        display_name: body.display_name,
        description: body.description,
        creation_timestamp: None,
        status: None,
    };
    store.update(&meta).await?;
    Ok(Json(meta))
}

async fn delete(
    Extension(client): Extension<kube::Client>,
    Path(project): Path<String>,
) -> Result<StatusCode, GatewayError> {
    // Idempotent for a missing namespace; an existing unmanaged
    // namespace is never deleted and answers not-found.
    let store = ProjectStore::new(client);
    store.delete(&project).await?;
    Ok(StatusCode::NO_CONTENT)
}
