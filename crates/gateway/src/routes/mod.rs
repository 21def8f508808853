// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router assembly.
//!
//! Routers are merged with full paths (no nesting) so middleware always
//! sees the original URI. Health and metrics stay outside the auth
//! layer; everything else under `/api` is authenticated, and everything
//! under `/api/projects/:project` additionally passes the managed-
//! namespace check.

pub mod access;
pub mod bugfix;
pub mod git;
pub mod messages;
pub mod projects;
pub mod rfe;
pub mod secrets;
pub mod sessions;
pub mod workspace_routes;

use crate::state::AppState;
use crate::{auth, project_ctx};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Helper: operations a key-authenticated caller is allowed to perform
/// are checked against the key's role; user identities rely on RBAC via
/// impersonation instead.
pub(crate) fn require_key_role(
    identity: &ambient_cluster::Identity,
    op: ambient_core::Operation,
) -> Result<(), crate::error::GatewayError> {
    if let Some(role) = identity.key_role {
        if !role.allows(op) {
            return Err(crate::error::GatewayError::forbidden(format!(
                "access key role {role} does not allow this operation"
            )));
        }
    }
    Ok(())
}

/// The full gateway router.
pub fn router(state: AppState) -> Router {
    let project_scoped = Router::new()
        .merge(sessions::routes())
        .merge(messages::routes())
        .merge(workspace_routes::routes())
        .merge(rfe::routes())
        .merge(bugfix::routes())
        .merge(access::routes())
        .merge(secrets::routes())
        .merge(git::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            project_ctx::middleware,
        ));

    let api = Router::new()
        .merge(projects::routes())
        .merge(project_scoped)
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth::middleware));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> (StatusCode, String) {
    // Minimal liveness counters; scraping details live with the deployment.
    (StatusCode::OK, "ambient_gateway_up 1\n".to_string())
}
