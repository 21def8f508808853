// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider-agnostic repository surface.
//!
//! Adapters are constructed per request with the caller's token; the
//! shared `reqwest::Client` underneath only pools connections.

use crate::detect::RepoRef;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// One entry of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    /// "file" or "dir".
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// File contents at a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub path: String,
    /// Decoded UTF-8 content (lossy for binary files).
    pub content: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// A fork of an upstream repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoFork {
    pub full_name: String,
    pub clone_url: String,
    pub owner: String,
}

/// Request body for PR creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPullRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Source branch (head).
    pub head: String,
    /// Target branch (base).
    pub base: String,
    #[serde(default)]
    pub draft: bool,
}

/// A pull/merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub state: String,
}

/// Request body for issue creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// An issue on the tracker side of the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub state: String,
}

/// A comment on an issue or PR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: u64,
    pub html_url: String,
    pub body: String,
}

/// A file attached to a gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub content: String,
}

/// One file of a compare result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Result of comparing two refs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResult {
    pub ahead_by: u64,
    pub behind_by: u64,
    #[serde(default)]
    pub files: Vec<DiffFile>,
}

/// Operations every provider adapter implements. GitHub-only operations
/// (gists) fail with a validation error on other providers.
#[async_trait]
pub trait GitProvider: Send + Sync {
    async fn list_branches(&self, repo: &RepoRef) -> Result<Vec<Branch>, ProviderError>;

    /// Non-recursive tree listing at (ref, path).
    async fn get_tree(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError>;

    async fn get_blob(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        path: &str,
    ) -> Result<Blob, ProviderError>;

    /// Forks of `repo` owned by the authenticated user.
    async fn list_user_forks(&self, repo: &RepoRef) -> Result<Vec<RepoFork>, ProviderError>;

    async fn create_fork(&self, repo: &RepoRef) -> Result<RepoFork, ProviderError>;

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest, ProviderError>;

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<IssueComment>, ProviderError>;

    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ProviderError>;

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue)
        -> Result<Issue, ProviderError>;

    async fn update_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Issue, ProviderError>;

    /// PRs and issues share a comment stream on GitHub; GitLab maps this
    /// to merge-request notes.
    async fn add_pr_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ProviderError>;

    async fn compare(
        &self,
        repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<CompareResult, ProviderError>;

    /// Create a branch at `from_ref`. Succeeds if it already exists at
    /// any commit (idempotent for workflow setup).
    async fn create_branch(
        &self,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<(), ProviderError>;

    /// Delete a branch. Succeeds when the branch is already gone.
    async fn delete_branch(&self, repo: &RepoRef, name: &str) -> Result<(), ProviderError>;

    /// Create or update a file on a branch with a scripted commit.
    async fn put_file(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), ProviderError>;

    async fn create_gist(
        &self,
        _description: &str,
        _files: BTreeMap<String, GistFile>,
        _public: bool,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::validation("gists are only supported on GitHub"))
    }
}
