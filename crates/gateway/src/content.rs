// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace content service.
//!
//! The mode the gateway binary runs in inside the per-session content
//! sidecar: three endpoints over a local directory root, reachable only
//! through the session-scoped Service, hence no authentication. A
//! path-traversal guard keeps every access inside the root.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Clone)]
pub struct ContentState {
    pub root: PathBuf,
}

/// One listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

/// Resolve a client path against the root, rejecting traversal.
pub fn resolve(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested.trim_start_matches('/'));
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }
    Some(root.join(relative))
}

/// Router for content-service mode: `/content/{list,file,write}` plus the
/// `/health` readiness endpoint the sidecar probe hits.
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/content/list", get(list))
        .route("/content/file", get(file))
        .route("/content/write", put(write))
        .with_state(ContentState { root })
}

async fn list(
    State(state): State<ContentState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let dir = resolve(&state.root, &query.path).ok_or(StatusCode::BAD_REQUEST)?;
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StatusCode::NOT_FOUND)
        }
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = if query.path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", query.path.trim_end_matches('/'), name)
        };
        items.push(ContentEntry {
            name,
            path,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified_at: metadata.modified().ok().map(chrono::DateTime::from),
        });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(serde_json::json!({ "items": items })))
}

async fn file(
    State(state): State<ContentState>,
    Query(query): Query<PathQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let path = resolve(&state.root, &query.path).ok_or(StatusCode::BAD_REQUEST)?;
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn write(
    State(state): State<ContentState>,
    Query(query): Query<PathQuery>,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    if query.path.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let path = resolve(&state.root, &query.path).ok_or(StatusCode::BAD_REQUEST)?;
    if let Some(parent) = path.parent() {
        if tokio::fs::create_dir_all(parent).await.is_err() {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
    match tokio::fs::write(&path, body).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
