// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ambient-providers: git-provider and issue-tracker adapters.
//!
//! Provider-agnostic repo/branch/tree/blob/PR/issue access over GitHub and
//! GitLab, GitHub App installation-token minting with caching, the
//! deterministic working-branch naming rules, and a minimal Jira client
//! for workflow mirroring. Identity never lives in the adapters: every
//! operation takes the caller's token from request context.

pub mod aggregate;
pub mod api;
pub mod branch;
pub mod detect;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod jira;
pub mod token;

pub use aggregate::{aggregate_results, MultiRepoResult, RepoResult};
pub use api::{
    Blob, Branch, CompareResult, DiffFile, GistFile, GitProvider, Issue, IssueComment, NewIssue,
    NewPullRequest, PullRequest, RepoFork, TreeEntry,
};
pub use branch::{
    is_protected, resolve_working_branch, BranchInput, PROTECTED_BRANCHES, WORK_BRANCH_PREFIX,
};
pub use detect::{parse_issue_url, Provider, RepoRef};
pub use error::{ProviderError, ProviderErrorKind};
pub use github::GithubClient;
pub use gitlab::GitlabClient;
pub use jira::{JiraClient, JiraConfig, JiraIssue};
pub use token::{GithubAppConfig, InstallationRecord, TokenManager};

/// Request timeout applied to every provider HTTP call.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Build the shared HTTP client used by all adapters. Construct once at
/// process start; per-request adapters borrow its connection pool.
pub fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("ambient-control-plane/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::other(format!("failed to build http client: {e}")))
}
