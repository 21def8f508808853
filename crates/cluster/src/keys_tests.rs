// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::FakeClock;

#[test]
fn generated_tokens_are_prefixed_and_unique() {
    let a = generate_token();
    let b = generate_token();
    assert!(a.starts_with(KEY_TOKEN_PREFIX));
    assert_ne!(a, b);
    assert_eq!(a.len(), KEY_TOKEN_PREFIX.len() + 40);
}

#[test]
fn prefix_is_stable_and_short() {
    let token = format!("{KEY_TOKEN_PREFIX}abcdefghijklmnop");
    let prefix = token_prefix(&token);
    assert_eq!(prefix.len(), 12);
    assert!(token.starts_with(&prefix));
}

#[test]
fn hash_is_deterministic_and_not_the_token() {
    let token = generate_token();
    assert_eq!(hash_token(&token), hash_token(&token));
    assert_ne!(hash_token(&token), token);
    // hex sha-256
    assert_eq!(hash_token(&token).len(), 64);
}

#[test]
fn different_tokens_hash_differently() {
    assert_ne!(hash_token("ambk_a"), hash_token("ambk_b"));
}

#[test]
fn stored_record_never_serializes_cleartext() {
    let clock = FakeClock::new();
    let token = generate_token();
    let record = StoredAccessKey {
        id: KeyId::new(),
        name: "ci".into(),
        description: None,
        role: Role::Edit,
        prefix: token_prefix(&token),
        hash: hash_token(&token),
        created_at: clock.now_utc(),
        last_used_at: None,
    };
    let json = serde_json::to_string(&record).unwrap();
    assert!(!json.contains(&token));

    let back: StoredAccessKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn meta_drops_the_hash() {
    let record = StoredAccessKey {
        id: KeyId::from_string("key-1"),
        name: "ci".into(),
        description: Some("pipeline".into()),
        role: Role::View,
        prefix: "ambk_abc".into(),
        hash: "deadbeef".into(),
        created_at: FakeClock::new().now_utc(),
        last_used_at: None,
    };
    let meta = record.meta();
    let json = serde_json::to_value(&meta).unwrap();
    assert!(json.get("hash").is_none());
    assert_eq!(json["prefix"], "ambk_abc");
}
