// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner secret configuration endpoints.

use crate::dto::{Items, RunnerSecretValues};
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::{Identity, RunnerSecretConfig, RunnerSecretStore, WELL_KNOWN_RUNNER_KEYS};
use ambient_core::Operation;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project/secrets", get(list_secrets))
        .route(
            "/api/projects/:project/runner-secrets/config",
            get(get_config).put(put_config),
        )
        .route("/api/projects/:project/runner-secrets", get(get_values).put(put_values))
}

async fn list_secrets(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<Items<String>>, GatewayError> {
    require_key_role(&identity, Operation::SecretsManage)?;
    let store = RunnerSecretStore::new(client, &ctx.name);
    Ok(Json(Items::new(store.list_secrets().await?)))
}

async fn get_config(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<RunnerSecretConfig>, GatewayError> {
    require_key_role(&identity, Operation::SecretsManage)?;
    let store = RunnerSecretStore::new(client, &ctx.name);
    Ok(Json(store.config().await?))
}

async fn put_config(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<RunnerSecretConfig>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SecretsManage)?;
    let store = RunnerSecretStore::new(client, &ctx.name);
    store.set_config(&body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_values(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SecretsManage)?;
    let store = RunnerSecretStore::new(client, &ctx.name);
    let values = store.values().await?;
    Ok(Json(serde_json::json!({
        "values": values,
        "wellKnownKeys": WELL_KNOWN_RUNNER_KEYS,
    })))
}

/// Full overwrite: keys absent from the body are removed.
async fn put_values(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    Extension(client): Extension<kube::Client>,
    Json(body): Json<RunnerSecretValues>,
) -> Result<StatusCode, GatewayError> {
    require_key_role(&identity, Operation::SecretsManage)?;
    let store = RunnerSecretStore::new(client, &ctx.name);
    store.set_values(&body.values).await?;
    Ok(StatusCode::NO_CONTENT)
}
