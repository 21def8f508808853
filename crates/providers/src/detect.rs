// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider detection and repository references.

use crate::error::ProviderError;
use ambient_core::naming::normalize_git_url;
use serde::{Deserialize, Serialize};

/// Supported git providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Gitlab,
}

ambient_core::simple_display! {
    Provider {
        Github => "github",
        Gitlab => "gitlab",
    }
}

impl Provider {
    /// Infer the provider from a repository host. GitHub Enterprise hosts
    /// conventionally embed "github"; anything with "gitlab" maps to
    /// GitLab; unknown hosts default to GitHub (the API-compatible choice
    /// for enterprise installs behind custom domains).
    pub fn from_host(host: &str) -> Self {
        if host.contains("gitlab") {
            Provider::Gitlab
        } else {
            Provider::Github
        }
    }
}

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub provider: Provider,
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse a repository URL (https or ssh form). The owner may contain
    /// nested groups on GitLab (`group/sub/project`).
    pub fn parse(url: &str) -> Result<Self, ProviderError> {
        let normalized = normalize_git_url(url);
        let rest = normalized
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| ProviderError::validation(format!("not a repository URL: {url}")))?;
        let mut segments = rest.split('/');
        let host = segments
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ProviderError::validation(format!("missing host in URL: {url}")))?
            .to_string();
        let path: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
        if path.len() < 2 {
            return Err(ProviderError::validation(format!(
                "repository URL must contain owner and name: {url}"
            )));
        }
        let repo = path[path.len() - 1].to_string();
        let owner = path[..path.len() - 1].join("/");
        Ok(Self { provider: Provider::from_host(&host), host, owner, repo })
    }

    /// `owner/repo` path as providers expect it.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Canonical https URL.
    pub fn https_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.repo)
    }

    /// Base URL of the provider's REST API for this host.
    pub fn api_base(&self) -> String {
        match self.provider {
            Provider::Github => {
                if self.host == "github.com" {
                    "https://api.github.com".to_string()
                } else {
                    format!("https://{}/api/v3", self.host)
                }
            }
            Provider::Gitlab => format!("https://{}/api/v4", self.host),
        }
    }
}

/// Parse and validate an issue URL of the form
/// `https://<host>/<owner>/<repo>/issues/<number>` (or `/-/issues/<n>` on
/// GitLab). Returns the repo and issue number.
pub fn parse_issue_url(url: &str) -> Result<(RepoRef, u64), ProviderError> {
    let trimmed = url.trim().trim_end_matches('/');
    let marker = ["/-/issues/", "/issues/"]
        .into_iter()
        .find_map(|m| trimmed.find(m).map(|idx| (idx, m)))
        .ok_or_else(|| ProviderError::validation(format!("not an issue URL: {url}")))?;
    let (repo_part, rest) = trimmed.split_at(marker.0);
    let number_str = &rest[marker.1.len()..];
    let number: u64 = number_str
        .parse()
        .map_err(|_| ProviderError::validation(format!("invalid issue number in URL: {url}")))?;
    let repo = RepoRef::parse(repo_part)?;
    Ok((repo, number))
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
