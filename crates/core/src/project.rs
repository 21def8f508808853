// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Managed-project (namespace) contract.
//!
//! A project is a namespace carrying the managed label; the gateway
//! refuses to operate on anything else, even for otherwise-authorized
//! callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label marking a namespace as gateway-managed.
pub const MANAGED_LABEL: &str = "ambient-code.io/managed";

/// Expected value of [`MANAGED_LABEL`].
pub const MANAGED_LABEL_VALUE: &str = "true";

/// Annotation carrying the human-facing project name.
pub const ANNOTATION_DISPLAY_NAME: &str = "ambient-code.io/display-name";

/// Annotation carrying the project description.
pub const ANNOTATION_DESCRIPTION: &str = "ambient-code.io/description";

/// Returns true when the label set marks a managed namespace.
pub fn is_managed(labels: &BTreeMap<String, String>) -> bool {
    labels.get(MANAGED_LABEL).map(String::as_str) == Some(MANAGED_LABEL_VALUE)
}

/// Project view assembled from namespace metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Mirrors the namespace status phase (Active/Terminating).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProjectMeta {
    /// Build the label/annotation sets a managed namespace must carry.
    pub fn to_namespace_metadata(
        &self,
    ) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut labels = BTreeMap::new();
        labels.insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());
        let mut annotations = BTreeMap::new();
        if let Some(ref display) = self.display_name {
            annotations.insert(ANNOTATION_DISPLAY_NAME.to_string(), display.clone());
        }
        if let Some(ref desc) = self.description {
            annotations.insert(ANNOTATION_DESCRIPTION.to_string(), desc.clone());
        }
        (labels, annotations)
    }

    /// Read display name/description back from namespace annotations.
    pub fn from_annotations(
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name: annotations.get(ANNOTATION_DISPLAY_NAME).cloned(),
            description: annotations.get(ANNOTATION_DESCRIPTION).cloned(),
            creation_timestamp: None,
            status: None,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
