// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project context middleware.
//!
//! Any path under `/api/projects/:project` requires the namespace to
//! exist and carry the managed label; otherwise the request fails with
//! not-found regardless of the caller's authorization. The validated
//! project name is placed in request extensions.

use crate::auth::project_from_path;
use crate::error::GatewayError;
use crate::state::AppState;
use ambient_cluster::ProjectStore;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Validated project name, available to all project-scoped handlers.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub name: String,
}

pub async fn middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(project) = project_from_path(request.uri().path()).map(String::from) else {
        return Err(GatewayError::not_found("missing project segment"));
    };
    // The managed-label check uses the service account: it only gates on
    // namespace metadata and must not leak authorization differences.
    let store = ProjectStore::new(state.factory.privileged()?);
    match store.get(&project).await? {
        Some(_) => {
            request.extensions_mut().insert(ProjectContext { name: project });
            Ok(next.run(request).await)
        }
        None => Err(GatewayError::not_found(format!("project {project:?} not found"))
            .with_remediation("Create the project first or check the name")),
    }
}
