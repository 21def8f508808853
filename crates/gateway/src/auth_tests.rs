// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::Role;
use axum::http::HeaderValue;

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

#[test]
fn forwarded_identity_parses_groups() {
    let headers = headers(&[
        (HDR_FORWARDED_USER, "alice"),
        (HDR_FORWARDED_EMAIL, "alice@acme.dev"),
        (HDR_FORWARDED_GROUPS, "devs, ops ,,"),
    ]);
    let identity = parse_forwarded(&headers).unwrap();
    assert_eq!(identity.user_id, "alice");
    assert_eq!(identity.display_name, "alice@acme.dev");
    assert_eq!(identity.groups, vec!["devs", "ops"]);
    assert!(identity.token.is_none());
}

#[test]
fn forwarded_token_rides_along() {
    let headers = headers(&[
        (HDR_FORWARDED_USER, "alice"),
        (HDR_FORWARDED_TOKEN, "sha256~abc"),
    ]);
    assert_eq!(parse_forwarded(&headers).unwrap().token.as_deref(), Some("sha256~abc"));
}

#[test]
fn missing_user_header_is_no_identity() {
    let headers = headers(&[(HDR_FORWARDED_GROUPS, "devs")]);
    assert!(parse_forwarded(&headers).is_none());
}

#[test]
fn bearer_token_requires_prefix() {
    assert_eq!(bearer_token(&headers(&[("authorization", "Bearer tok123")])), Some("tok123"));
    assert_eq!(bearer_token(&headers(&[("authorization", "Basic dXNlcg==")])), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

#[test]
fn api_key_from_either_carrier() {
    assert_eq!(
        presented_api_key(&headers(&[(HDR_API_KEY, "ambk_zzz")])),
        Some("ambk_zzz")
    );
    assert_eq!(
        presented_api_key(&headers(&[("authorization", "Bearer ambk_zzz")])),
        Some("ambk_zzz")
    );
    // A plain bearer token is not a key.
    assert_eq!(presented_api_key(&headers(&[("authorization", "Bearer sha256~x")])), None);
}

#[test]
fn project_extraction_from_path() {
    assert_eq!(project_from_path("/api/projects/acme/agentic-sessions"), Some("acme"));
    assert_eq!(project_from_path("/api/projects/acme"), Some("acme"));
    assert_eq!(project_from_path("/api/projects/"), None);
    assert_eq!(project_from_path("/api/cluster-info"), None);
}

#[test]
fn key_identity_is_synthetic_and_role_scoped() {
    let stored = ambient_cluster::StoredAccessKey {
        id: ambient_core::KeyId::from_string("key-9"),
        name: "ci".into(),
        description: None,
        role: Role::Edit,
        prefix: "ambk_abc".into(),
        hash: "h".into(),
        created_at: ambient_core::Clock::now_utc(&ambient_core::FakeClock::new()),
        last_used_at: None,
    };
    let identity = key_identity("acme", &stored);
    assert_eq!(identity.user_id, "ambient-key:key-9");
    assert_eq!(identity.groups, vec!["ambient:project:acme:role:edit"]);
    assert_eq!(identity.key_role, Some(Role::Edit));
    assert!(identity.token.is_none());
}
