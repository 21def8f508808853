// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Managed-namespace (project) lifecycle.

use crate::client::ClusterError;
use ambient_core::project::{is_managed, ProjectMeta, MANAGED_LABEL, MANAGED_LABEL_VALUE};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{ListParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client};

/// Namespace-backed project store.
pub struct ProjectStore {
    api: Api<Namespace>,
}

impl ProjectStore {
    pub fn new(client: Client) -> Self {
        Self { api: Api::all(client) }
    }

    fn to_meta(ns: &Namespace) -> ProjectMeta {
        let annotations = ns.metadata.annotations.clone().unwrap_or_default();
        let mut meta = ProjectMeta::from_annotations(
            ns.metadata.name.as_deref().unwrap_or_default(),
            &annotations,
        );
        meta.creation_timestamp = ns
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|t| DateTime::<Utc>::from(t.0));
        meta.status = ns.status.as_ref().and_then(|s| s.phase.clone());
        meta
    }

    /// List projects: only namespaces carrying the managed label.
    pub async fn list(&self) -> Result<Vec<ProjectMeta>, ClusterError> {
        let selector = format!("{MANAGED_LABEL}={MANAGED_LABEL_VALUE}");
        let namespaces = self.api.list(&ListParams::default().labels(&selector)).await?;
        Ok(namespaces.items.iter().map(Self::to_meta).collect())
    }

    /// Fetch the raw namespace when it exists **and** carries the managed
    /// label. Unmanaged namespaces are invisible to the control plane:
    /// every read and write path goes through this gate.
    async fn get_managed(&self, name: &str) -> Result<Option<Namespace>, ClusterError> {
        let ns = match self.api.get(name).await {
            Ok(ns) => ns,
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !is_managed(&ns.metadata.labels.clone().unwrap_or_default()) {
            return Ok(None);
        }
        Ok(Some(ns))
    }

    /// Fetch one project; None when the namespace is absent or not managed.
    pub async fn get(&self, name: &str) -> Result<Option<ProjectMeta>, ClusterError> {
        Ok(self.get_managed(name).await?.as_ref().map(Self::to_meta))
    }

    /// Create a managed namespace for the project.
    pub async fn create(&self, meta: &ProjectMeta) -> Result<ProjectMeta, ClusterError> {
        let (labels, annotations) = meta.to_namespace_metadata();
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(meta.name.clone()),
                labels: Some(labels),
                annotations: Some(annotations),
                ..Default::default()
            },
            ..Default::default()
        };
        let created = self.api.create(&PostParams::default(), &ns).await?;
        Ok(Self::to_meta(&created))
    }

    /// Update display name/description annotations. Refuses namespaces
    /// that are absent or unmanaged with not-found, so the write path is
    /// gated on the managed label exactly like the read path.
    pub async fn update(&self, meta: &ProjectMeta) -> Result<(), ClusterError> {
        if self.get_managed(&meta.name).await?.is_none() {
            return Err(ClusterError::NotFound(format!("project {:?} not found", meta.name)));
        }
        let (_, annotations) = meta.to_namespace_metadata();
        let patch = serde_json::json!({ "metadata": { "annotations": annotations } });
        self.api.patch(&meta.name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
        Ok(())
    }

    /// Delete the namespace (and everything in it). Idempotent for a
    /// missing namespace; an existing unmanaged namespace is never
    /// deleted and reads as not-found.
    pub async fn delete(&self, name: &str) -> Result<(), ClusterError> {
        match self.api.get(name).await {
            Ok(ns) => {
                if !is_managed(&ns.metadata.labels.clone().unwrap_or_default()) {
                    return Err(ClusterError::NotFound(format!("project {name:?} not found")));
                }
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        match self.api.delete(name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
