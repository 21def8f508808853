// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner secret configuration.
//!
//! The selected secret is a standard opaque Secret mounted into every
//! session job. Updates are a full overwrite of the declared keys; keys
//! absent from the update are removed. The eight well-known keys have UI
//! affordances only — the server treats them like any other entry.

use crate::client::ClusterError;
use crate::crd::{ProjectSettings, ProjectSettingsSpec, PROJECT_SETTINGS_NAME};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys the UI renders dedicated fields for.
pub const WELL_KNOWN_RUNNER_KEYS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "GIT_USER_NAME",
    "GIT_USER_EMAIL",
    "GIT_TOKEN",
    "JIRA_URL",
    "JIRA_PROJECT",
    "JIRA_EMAIL",
    "JIRA_API_TOKEN",
];

/// The project's runner-secret selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerSecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_secret_name: Option<String>,
}

/// Secret-backed runner configuration for one project.
pub struct RunnerSecretStore {
    secrets: Api<Secret>,
    settings: Api<ProjectSettings>,
}

impl RunnerSecretStore {
    pub fn new(client: Client, project: &str) -> Self {
        Self {
            secrets: Api::namespaced(client.clone(), project),
            settings: Api::namespaced(client, project),
        }
    }

    /// The currently selected secret name, if configured.
    pub async fn config(&self) -> Result<RunnerSecretConfig, ClusterError> {
        match self.settings.get(PROJECT_SETTINGS_NAME).await {
            Ok(s) => Ok(RunnerSecretConfig { selected_secret_name: s.spec.runner_secrets_name }),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(RunnerSecretConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the selected secret name in ProjectSettings.
    pub async fn set_config(&self, config: &RunnerSecretConfig) -> Result<(), ClusterError> {
        let patch = serde_json::json!({
            "apiVersion": format!("{}/{}", crate::crd::GROUP, crate::crd::VERSION),
            "kind": "ProjectSettings",
            "spec": { "runnerSecretsName": config.selected_secret_name }
        });
        match self
            .settings
            .patch(PROJECT_SETTINGS_NAME, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                let settings = ProjectSettings::new(
                    PROJECT_SETTINGS_NAME,
                    ProjectSettingsSpec {
                        runner_secrets_name: config.selected_secret_name.clone(),
                        ..Default::default()
                    },
                );
                self.settings.create(&PostParams::default(), &settings).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the selected secret's entries as UTF-8 strings.
    pub async fn values(&self) -> Result<BTreeMap<String, String>, ClusterError> {
        let Some(name) = self.config().await?.selected_secret_name else {
            return Ok(BTreeMap::new());
        };
        let secret = match self.secrets.get(&name).await {
            Ok(s) => s,
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).into_owned()))
            .collect())
    }

    /// Full overwrite of the selected secret's entries: keys absent from
    /// `values` are removed.
    pub async fn set_values(&self, values: &BTreeMap<String, String>) -> Result<(), ClusterError> {
        let Some(name) = self.config().await?.selected_secret_name else {
            return Err(ClusterError::Invalid(
                "no runner secret selected for this project".to_string(),
            ));
        };
        let data: BTreeMap<String, ByteString> = values
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
            .collect();
        let replacement = Secret {
            metadata: kube::api::ObjectMeta {
                name: Some(name.clone()),
                ..Default::default()
            },
            type_: Some("Opaque".to_string()),
            data: Some(data),
            ..Default::default()
        };
        match self.secrets.get(&name).await {
            Ok(existing) => {
                let mut replacement = replacement;
                replacement.metadata.namespace = existing.metadata.namespace.clone();
                replacement.metadata.resource_version = existing.metadata.resource_version.clone();
                self.secrets
                    .replace(&name, &PostParams::default(), &replacement)
                    .await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                self.secrets.create(&PostParams::default(), &replacement).await?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// List candidate opaque secrets in the project.
    pub async fn list_secrets(&self) -> Result<Vec<String>, ClusterError> {
        let secrets = self.secrets.list(&Default::default()).await?;
        Ok(secrets
            .items
            .into_iter()
            .filter(|s| s.type_.as_deref().unwrap_or("Opaque") == "Opaque")
            .filter_map(|s| s.metadata.name)
            .collect())
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
