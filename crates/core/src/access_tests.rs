// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    view_reads = { Role::View, Operation::SessionsRead, true },
    view_duplicates = { Role::View, Operation::SessionsDuplicate, true },
    view_cannot_create = { Role::View, Operation::SessionsCreate, false },
    view_cannot_delete = { Role::View, Operation::SessionsDelete, false },
    edit_creates = { Role::Edit, Operation::SessionsCreate, true },
    edit_reads = { Role::Edit, Operation::SessionsRead, true },
    edit_cannot_manage_keys = { Role::Edit, Operation::KeysManage, false },
    admin_all = { Role::Admin, Operation::PermissionsManage, true },
)]
fn role_matrix(role: Role, op: Operation, allowed: bool) {
    assert_eq!(role.allows(op), allowed);
}

#[test]
fn roles_are_ordered() {
    assert!(Role::Admin > Role::Edit);
    assert!(Role::Edit > Role::View);
}

#[test]
fn role_parses_from_str() {
    assert_eq!("edit".parse::<Role>().unwrap(), Role::Edit);
    assert!("owner".parse::<Role>().is_err());
}

#[test]
fn grants_compare_by_subject_only() {
    let a = PermissionGrant {
        subject_type: SubjectType::User,
        subject_name: "alice".into(),
        role: Role::View,
    };
    let b = PermissionGrant { role: Role::Admin, ..a.clone() };
    let c = PermissionGrant {
        subject_type: SubjectType::Group,
        subject_name: "alice".into(),
        role: Role::View,
    };
    assert!(a.same_subject(&b));
    assert!(!a.same_subject(&c));
}
