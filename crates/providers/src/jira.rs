// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal Jira client for workflow mirroring.
//!
//! Only the field mapping the workflows need: create an issue with
//! {project, summary, description, issuetype} and update summary or
//! description by key. Credentials come from the project's runner secret.

use crate::error::ProviderError;
use serde::Deserialize;
use serde_json::json;

/// Jira connection settings, read from the runner secret's well-known keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraConfig {
    /// Base URL, e.g. `https://issues.example.com`.
    pub url: String,
    /// Project key new issues are filed under.
    pub project: String,
    pub email: String,
    pub api_token: String,
}

/// A created or updated Jira issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    #[serde(rename = "self")]
    pub self_url: String,
}

pub struct JiraClient {
    http: reqwest::Client,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(http: reqwest::Client, config: JiraConfig) -> Self {
        Self { http, config }
    }

    /// Browse URL of an issue on this Jira instance.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.config.url.trim_end_matches('/'))
    }

    /// Create an issue; returns its key.
    pub async fn create_issue(
        &self,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<JiraIssue, ProviderError> {
        let url = format!("{}/rest/api/2/issue", self.config.url.trim_end_matches('/'));
        let body = json!({
            "fields": {
                "project": { "key": self.config.project },
                "summary": summary,
                "description": description,
                "issuetype": { "name": issue_type },
            }
        });
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("jira create: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("jira create: {}", ambient_core::short(&body, 200)),
                None,
            )
            .with_remediation("Check the Jira URL, project key, and API token in runner secrets"));
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::other(format!("jira create: malformed response: {e}")))
    }

    /// Update an existing issue's summary/description.
    pub async fn update_issue(
        &self,
        key: &str,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/rest/api/2/issue/{key}", self.config.url.trim_end_matches('/'));
        let mut fields = serde_json::Map::new();
        if let Some(summary) = summary {
            fields.insert("summary".into(), json!(summary));
        }
        if let Some(description) = description {
            fields.insert("description".into(), json!(description));
        }
        let response = self
            .http
            .put(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("jira update: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("jira update {key}: {}", ambient_core::short(&body, 200)),
                None,
            ));
        }
        Ok(())
    }
}
