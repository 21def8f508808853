// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Roles, permission grants, and access-key metadata.
//!
//! Role semantics are fixed: view = read + duplicate sessions,
//! edit = view + create sessions, admin = everything. Grants are unique
//! per (subjectType, subjectName); access-key plaintext is revealed
//! exactly once at creation and only its hash is ever stored.

use crate::id::KeyId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Project-scoped role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    View,
    Edit,
    Admin,
}

crate::simple_display! {
    Role {
        View => "view",
        Edit => "edit",
        Admin => "admin",
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Role::View),
            "edit" => Ok(Role::Edit),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Operations gated by the role matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SessionsRead,
    SessionsDuplicate,
    SessionsCreate,
    SessionsDelete,
    WorkflowsManage,
    KeysManage,
    PermissionsManage,
    SecretsManage,
    ProjectManage,
}

impl Role {
    /// Role matrix: view ⊂ edit ⊂ admin.
    pub fn allows(self, op: Operation) -> bool {
        match self {
            Role::View => matches!(op, Operation::SessionsRead | Operation::SessionsDuplicate),
            Role::Edit => {
                Role::View.allows(op) || matches!(op, Operation::SessionsCreate)
            }
            Role::Admin => true,
        }
    }
}

/// Kind of subject a permission grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Group,
}

crate::simple_display! {
    SubjectType {
        User => "user",
        Group => "group",
    }
}

/// A role granted to a user or group on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub subject_type: SubjectType,
    pub subject_name: String,
    pub role: Role,
}

impl PermissionGrant {
    /// Grants are unique per subject, regardless of role.
    pub fn same_subject(&self, other: &PermissionGrant) -> bool {
        self.subject_type == other.subject_type && self.subject_name == other.subject_name
    }
}

/// Access-key record as exposed to clients. The token itself never
/// appears here; only its display prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyMeta {
    pub id: KeyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role: Role,
    /// First characters of the token, for identification in listings.
    pub prefix: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
