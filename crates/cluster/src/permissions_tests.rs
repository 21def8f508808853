// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::Role;

fn grant(subject_type: SubjectType, name: &str, role: Role) -> PermissionGrant {
    PermissionGrant { subject_type, subject_name: name.into(), role }
}

#[test]
fn grant_is_unique_per_subject() {
    let mut grants = Vec::new();
    assert!(apply_grant(&mut grants, grant(SubjectType::User, "alice", Role::View)));
    // Same subject, different role: still a conflict.
    assert!(!apply_grant(&mut grants, grant(SubjectType::User, "alice", Role::Admin)));
    assert_eq!(grants.len(), 1);
}

#[test]
fn same_name_different_type_is_distinct() {
    let mut grants = Vec::new();
    assert!(apply_grant(&mut grants, grant(SubjectType::User, "devs", Role::View)));
    assert!(apply_grant(&mut grants, grant(SubjectType::Group, "devs", Role::Edit)));
    assert_eq!(grants.len(), 2);
}

#[test]
fn revoke_is_idempotent() {
    let mut grants = vec![grant(SubjectType::User, "alice", Role::View)];
    assert!(remove_grant(&mut grants, SubjectType::User, "alice"));
    assert!(!remove_grant(&mut grants, SubjectType::User, "alice"));
    assert!(grants.is_empty());
}

#[test]
fn revoke_leaves_other_subjects() {
    let mut grants = vec![
        grant(SubjectType::User, "alice", Role::View),
        grant(SubjectType::Group, "devs", Role::Edit),
    ];
    remove_grant(&mut grants, SubjectType::User, "alice");
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].subject_name, "devs");
}
