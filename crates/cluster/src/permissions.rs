// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission grants on ProjectSettings.
//!
//! A subject holds at most one role. Granting an already-granted subject
//! is a conflict; revoking an absent grant is a no-op.

use crate::client::ClusterError;
use crate::crd::{ProjectSettings, ProjectSettingsSpec, PROJECT_SETTINGS_NAME};
use ambient_core::{PermissionGrant, SubjectType};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};

/// Apply a grant to the in-memory grant list. Returns false when the
/// subject already holds any role (conflict).
pub fn apply_grant(grants: &mut Vec<PermissionGrant>, grant: PermissionGrant) -> bool {
    if grants.iter().any(|g| g.same_subject(&grant)) {
        return false;
    }
    grants.push(grant);
    true
}

/// Remove a grant by subject. Returns whether anything was removed.
pub fn remove_grant(
    grants: &mut Vec<PermissionGrant>,
    subject_type: SubjectType,
    subject_name: &str,
) -> bool {
    let before = grants.len();
    grants.retain(|g| !(g.subject_type == subject_type && g.subject_name == subject_name));
    grants.len() != before
}

/// ProjectSettings-backed grant store for one project.
pub struct PermissionStore {
    api: Api<ProjectSettings>,
    project: String,
}

impl PermissionStore {
    pub fn new(client: Client, project: &str) -> Self {
        Self { api: Api::namespaced(client, project), project: project.to_string() }
    }

    pub async fn list(&self) -> Result<Vec<PermissionGrant>, ClusterError> {
        Ok(self.load().await?.map(|s| s.spec.group_access).unwrap_or_default())
    }

    /// Grant a role. Fails with a conflict when the subject already holds
    /// any role.
    pub async fn grant(&self, grant: PermissionGrant) -> Result<(), ClusterError> {
        let mut settings = self.load().await?.unwrap_or_else(|| {
            ProjectSettings::new(PROJECT_SETTINGS_NAME, ProjectSettingsSpec::default())
        });
        if !apply_grant(&mut settings.spec.group_access, grant.clone()) {
            return Err(ClusterError::Invalid(format!(
                "{} {:?} already holds a role in project {}",
                grant.subject_type, grant.subject_name, self.project
            )));
        }
        self.save(settings).await
    }

    /// Revoke by subject. Idempotent.
    pub async fn revoke(
        &self,
        subject_type: SubjectType,
        subject_name: &str,
    ) -> Result<(), ClusterError> {
        let Some(mut settings) = self.load().await? else {
            return Ok(());
        };
        if remove_grant(&mut settings.spec.group_access, subject_type, subject_name) {
            self.save(settings).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<ProjectSettings>, ClusterError> {
        match self.api.get(PROJECT_SETTINGS_NAME).await {
            Ok(s) => Ok(Some(s)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, mut settings: ProjectSettings) -> Result<(), ClusterError> {
        settings.metadata.managed_fields = None;
        if settings.metadata.resource_version.is_some() {
            self.api
                .patch(
                    PROJECT_SETTINGS_NAME,
                    &PatchParams::default(),
                    &Patch::Merge(&serde_json::json!({ "spec": settings.spec })),
                )
                .await?;
        } else {
            self.api.create(&PostParams::default(), &settings).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
