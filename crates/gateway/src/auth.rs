// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request authentication.
//!
//! Three mutually exclusive schemes, attempted in order: forwarded
//! identity headers from the auth proxy, a directly-presented bearer
//! token, and a project access key matched by prefix against stored
//! hashes. On success the caller's identity and an impersonated cluster
//! client land in request extensions; on failure the request is rejected
//! before any cluster call is made on its behalf.

use crate::error::GatewayError;
use crate::state::AppState;
use ambient_cluster::keys::KEY_TOKEN_PREFIX;
use ambient_cluster::{AccessKeyStore, Identity};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

/// Forwarded identity headers injected by the upstream proxy.
pub const HDR_FORWARDED_USER: &str = "x-forwarded-user";
pub const HDR_FORWARDED_EMAIL: &str = "x-forwarded-email";
pub const HDR_FORWARDED_GROUPS: &str = "x-forwarded-groups";
pub const HDR_FORWARDED_TOKEN: &str = "x-forwarded-access-token";

/// Direct access-key header (alternative to a bearer with the key prefix).
pub const HDR_API_KEY: &str = "x-ambient-api-key";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
}

/// Scheme 1: forwarded identity.
pub fn parse_forwarded(headers: &HeaderMap) -> Option<Identity> {
    let user = header(headers, HDR_FORWARDED_USER)?;
    let display = header(headers, HDR_FORWARDED_EMAIL).unwrap_or(user);
    let groups = header(headers, HDR_FORWARDED_GROUPS)
        .map(|g| g.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default();
    let mut identity = Identity::from_forwarded(user, display, groups);
    // The proxy may forward the user's own token; prefer it over
    // impersonation so audit logs carry the real principal.
    identity.token = header(headers, HDR_FORWARDED_TOKEN).map(String::from);
    Some(identity)
}

/// Scheme 2/3 carrier: the bearer token, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header(headers, "authorization")?.strip_prefix("Bearer ").map(str::trim)
}

/// Scheme 3 carrier: an access key from either header form.
pub fn presented_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = header(headers, HDR_API_KEY) {
        return Some(key);
    }
    bearer_token(headers).filter(|t| t.starts_with(KEY_TOKEN_PREFIX))
}

/// Project segment of a request path (`/api/projects/<p>/...`).
pub fn project_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/api/projects/")?;
    let project = rest.split('/').next()?;
    if project.is_empty() {
        None
    } else {
        Some(project)
    }
}

/// Synthetic impersonation identity for an authenticated access key.
pub fn key_identity(project: &str, key: &ambient_cluster::StoredAccessKey) -> Identity {
    let mut identity = Identity::from_forwarded(
        &format!("ambient-key:{}", key.id),
        &key.name,
        vec![format!("ambient:project:{project}:role:{}", key.role)],
    );
    identity.key_role = Some(key.role);
    identity
}

/// Authentication middleware for the `/api` surface.
pub async fn middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let headers = request.headers().clone();
    let path = request.uri().path().to_string();

    let identity = if let Some(identity) = parse_forwarded(&headers) {
        identity
    } else if let Some(key) = presented_api_key(&headers) {
        authenticate_key(&state, &path, key).await?
    } else if let Some(token) = bearer_token(&headers) {
        Identity::from_token(token)
    } else {
        return Err(GatewayError::unauthenticated("no credentials presented"));
    };

    let client = state
        .factory
        .for_identity(&identity)
        .map_err(|e| GatewayError::unauthenticated(format!("cannot build caller client: {e}")))?;

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(client);
    Ok(next.run(request).await)
}

async fn authenticate_key(
    state: &AppState,
    path: &str,
    key: &str,
) -> Result<Identity, GatewayError> {
    let Some(project) = project_from_path(path) else {
        return Err(GatewayError::unauthenticated(
            "access keys are project-scoped; use a project path",
        ));
    };
    // Key lookup runs before an identity exists, so it uses the service
    // account — this is the only privileged step on the request path.
    let client = state.factory.privileged()?;
    let store = AccessKeyStore::new(client, project);
    match store.authenticate(key, &state.clock).await? {
        Some(stored) => Ok(key_identity(project, &stored)),
        None => Err(GatewayError::unauthenticated("invalid or revoked access key")),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
