// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access probe, permission grants, and access keys.

use crate::dto::{AccessResponse, GrantRequest, Items};
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::{highest_role, AccessKeyStore, Identity, NewKeyRequest, PermissionStore};
use ambient_core::{AccessKeyMeta, KeyId, Operation, PermissionGrant, Role, SubjectType};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/access", get(access))
        .route("/api/projects/:project/permissions", get(list_permissions).post(grant))
        .route(
            "/api/projects/:project/permissions/:subject_type/:subject_name",
            axum::routing::delete(revoke),
        )
        .route("/api/projects/:project/keys", get(list_keys).post(create_key))
        .route("/api/projects/:project/keys/:key_id", axum::routing::delete(delete_key))
}

/// The caller's own highest role, via SSAR probes under their identity.
async fn access(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<AccessResponse>, GatewayError> {
    // Key-authenticated callers already carry an explicit role.
    if let Some(role) = identity.key_role {
        return Ok(Json(AccessResponse { role: Some(role) }));
    }
    let role = highest_role(&client, &ctx.name).await?;
    Ok(Json(AccessResponse { role }))
}

async fn list_permissions(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<PermissionGrant>>, GatewayError> {
    require_key_role(&identity, Operation::PermissionsManage)?;
    let store = PermissionStore::new(client, &ctx.name);
    Ok(Json(Items::new(store.list().await?)))
}

async fn grant(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<GrantRequest>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::PermissionsManage)?;
    let store = PermissionStore::new(client, &ctx.name);
    store.grant(body.into_grant()).await?;
    Ok(StatusCode::CREATED)
}

async fn revoke(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, subject_type, subject_name)): Path<(String, String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::PermissionsManage)?;
    let subject_type = match subject_type.as_str() {
        "user" => SubjectType::User,
        "group" => SubjectType::Group,
        other => {
            return Err(GatewayError::validation(format!("unknown subject type {other:?}")))
        }
    };
    let store = PermissionStore::new(client, &ctx.name);
    store.revoke(subject_type, &subject_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_keys(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<AccessKeyMeta>>, GatewayError> {
    require_key_role(&identity, Operation::KeysManage)?;
    let store = AccessKeyStore::new(client, &ctx.name);
    Ok(Json(Items::new(store.list().await?)))
}

async fn create_key(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    State(state): State<AppState>,
    Json(body): Json<NewKeyRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::KeysManage)?;
    if body.name.trim().is_empty() {
        return Err(GatewayError::validation("key name is required"));
    }
    if body.role == Role::Admin && identity.key_role.is_some() {
        // A key may never mint a stronger credential than itself.
        return Err(GatewayError::forbidden("access keys cannot create admin keys"));
    }
    let store = AccessKeyStore::new(client, &ctx.name);
    let revealed = store.create(&body, &state.clock).await?;
    // The cleartext appears in this response and nowhere else, ever.
    Ok((StatusCode::CREATED, Json(serde_json::to_value(&revealed).unwrap_or_default())))
}

async fn delete_key(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Path((_, key_id)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::KeysManage)?;
    let store = AccessKeyStore::new(client, &ctx.name);
    store.delete(&KeyId::from_string(key_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
