// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub App user-to-installation mapping.
//!
//! Stored in a per-namespace ConfigMap so installation links survive
//! restarts without a database; one JSON record per user id.

use crate::client::ClusterError;
use ambient_providers::InstallationRecord;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;

/// Name of the per-namespace mapping ConfigMap.
const INSTALLATIONS_CONFIGMAP: &str = "ambient-github-installations";

/// ConfigMap-backed installation store for one project.
pub struct InstallationStore {
    api: Api<ConfigMap>,
    project: String,
}

impl InstallationStore {
    pub fn new(client: Client, project: &str) -> Self {
        Self { api: Api::namespaced(client, project), project: project.to_string() }
    }

    /// Resolve the installation linked to a user, if any.
    pub async fn get_installation(
        &self,
        user_id: &str,
    ) -> Result<Option<InstallationRecord>, ClusterError> {
        let cm = match self.api.get(INSTALLATIONS_CONFIGMAP).await {
            Ok(cm) => cm,
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let Some(raw) = cm.data.unwrap_or_default().remove(user_id) else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            ClusterError::Invalid(format!(
                "corrupt installation record for {user_id} in {}: {e}",
                self.project
            ))
        })
    }

    /// Link (or relink) a user to an installation.
    pub async fn set_installation(&self, record: &InstallationRecord) -> Result<(), ClusterError> {
        let raw = serde_json::to_string(record)
            .map_err(|e| ClusterError::Invalid(format!("installation record: {e}")))?;
        let mut data = BTreeMap::new();
        data.insert(record.user_id.clone(), raw);
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some(INSTALLATIONS_CONFIGMAP.to_string()),
                namespace: Some(self.project.clone()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        match self
            .api
            .patch(
                INSTALLATIONS_CONFIGMAP,
                &PatchParams::apply("ambient-gateway").force(),
                &Patch::Apply(&cm),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                self.api.create(&PostParams::default(), &cm).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unlink a user. Idempotent.
    pub async fn remove_installation(&self, user_id: &str) -> Result<(), ClusterError> {
        let patch = serde_json::json!({ "data": { user_id: null } });
        match self
            .api
            .patch(INSTALLATIONS_CONFIGMAP, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
