// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub adapter (github.com and Enterprise hosts).

use crate::api::{
    Blob, Branch, CompareResult, GistFile, GitProvider, Issue, IssueComment, NewIssue,
    NewPullRequest, PullRequest, RepoFork, TreeEntry,
};
use crate::detect::RepoRef;
use crate::error::ProviderError;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Per-request GitHub adapter: shared connection pool, caller's token.
pub struct GithubClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self { http, token }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, ProviderError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("{context}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let reset = rate_limit_reset(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("{context}: {}", ambient_core::short(&body, 200)),
                reset,
            ));
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::other(format!("{context}: malformed response: {e}")))
    }
}

fn rate_limit_reset(headers: &reqwest::header::HeaderMap) -> Option<DateTime<Utc>> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?;
    if remaining != "0" {
        return None;
    }
    let reset = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    Utc.timestamp_opt(reset, 0).single()
}

#[derive(Deserialize)]
struct GhBranch {
    name: String,
    #[serde(default)]
    protected: bool,
    commit: GhCommitRef,
}

#[derive(Deserialize)]
struct GhCommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct GhContent {
    name: String,
    path: String,
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    size: u64,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct GhRepo {
    full_name: String,
    clone_url: String,
    owner: GhOwner,
    #[serde(default)]
    fork: bool,
}

#[derive(Deserialize)]
struct GhOwner {
    login: String,
}

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    html_url: String,
    title: String,
    state: String,
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    html_url: String,
    title: String,
    state: String,
}

#[derive(Deserialize)]
struct GhComment {
    id: u64,
    html_url: String,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct GhCompare {
    ahead_by: u64,
    behind_by: u64,
    #[serde(default)]
    files: Vec<GhDiffFile>,
}

#[derive(Deserialize)]
struct GhDiffFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Deserialize)]
struct GhGist {
    html_url: String,
}

#[async_trait]
impl GitProvider for GithubClient {
    async fn list_branches(&self, repo: &RepoRef) -> Result<Vec<Branch>, ProviderError> {
        let url = format!("{}/repos/{}/branches?per_page=100", repo.api_base(), repo.full_name());
        let branches: Vec<GhBranch> =
            self.send(self.request(reqwest::Method::GET, url), "list branches").await?;
        Ok(branches
            .into_iter()
            .map(|b| Branch { name: b.name, protected: b.protected, sha: Some(b.commit.sha) })
            .collect())
    }

    async fn get_tree(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError> {
        let url = format!(
            "{}/repos/{}/contents/{}?ref={}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(path).replace("%2F", "/"),
            urlencoding::encode(git_ref),
        );
        let contents: Vec<GhContent> =
            self.send(self.request(reqwest::Method::GET, url), "read tree").await?;
        Ok(contents
            .into_iter()
            .map(|c| TreeEntry {
                name: c.name,
                path: c.path,
                entry_type: if c.content_type == "dir" { "dir".into() } else { "file".into() },
                size: Some(c.size),
                sha: Some(c.sha),
            })
            .collect())
    }

    async fn get_blob(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        path: &str,
    ) -> Result<Blob, ProviderError> {
        let url = format!(
            "{}/repos/{}/contents/{}?ref={}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(path).replace("%2F", "/"),
            urlencoding::encode(git_ref),
        );
        let content: GhContent =
            self.send(self.request(reqwest::Method::GET, url), "read blob").await?;
        if content.content_type == "dir" {
            return Err(ProviderError::validation(format!("{path} is a directory")));
        }
        let decoded = match (content.content, content.encoding.as_deref()) {
            (Some(data), Some("base64")) => {
                let stripped: String = data.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(stripped)
                    .map_err(|e| ProviderError::other(format!("blob decode failed: {e}")))?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            (Some(data), _) => data,
            (None, _) => String::new(),
        };
        Ok(Blob { path: content.path, content: decoded, size: content.size, sha: Some(content.sha) })
    }

    async fn list_user_forks(&self, repo: &RepoRef) -> Result<Vec<RepoFork>, ProviderError> {
        // The authenticated user's repos, filtered to forks of the upstream.
        let url = format!("{}/user/repos?per_page=100&type=owner", repo.api_base());
        let repos: Vec<GhRepo> =
            self.send(self.request(reqwest::Method::GET, url), "list forks").await?;
        Ok(repos
            .into_iter()
            .filter(|r| r.fork && r.full_name.ends_with(&format!("/{}", repo.repo)))
            .map(|r| RepoFork { full_name: r.full_name, clone_url: r.clone_url, owner: r.owner.login })
            .collect())
    }

    async fn create_fork(&self, repo: &RepoRef) -> Result<RepoFork, ProviderError> {
        let url = format!("{}/repos/{}/forks", repo.api_base(), repo.full_name());
        let forked: GhRepo =
            self.send(self.request(reqwest::Method::POST, url), "create fork").await?;
        Ok(RepoFork {
            full_name: forked.full_name,
            clone_url: forked.clone_url,
            owner: forked.owner.login,
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest, ProviderError> {
        let url = format!("{}/repos/{}/pulls", repo.api_base(), repo.full_name());
        let body = json!({
            "title": request.title,
            "body": request.body,
            "head": request.head,
            "base": request.base,
            "draft": request.draft,
        });
        let pr: GhPull = self
            .send(self.request(reqwest::Method::POST, url).json(&body), "create pull request")
            .await?;
        Ok(PullRequest { number: pr.number, html_url: pr.html_url, title: pr.title, state: pr.state })
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<IssueComment>, ProviderError> {
        let url = format!(
            "{}/repos/{}/issues/{number}/comments?per_page=100",
            repo.api_base(),
            repo.full_name()
        );
        let comments: Vec<GhComment> =
            self.send(self.request(reqwest::Method::GET, url), "list issue comments").await?;
        Ok(comments
            .into_iter()
            .map(|c| IssueComment { id: c.id, html_url: c.html_url, body: c.body })
            .collect())
    }

    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ProviderError> {
        let url = format!(
            "{}/repos/{}/issues/{number}/comments",
            repo.api_base(),
            repo.full_name()
        );
        let comment: GhComment = self
            .send(
                self.request(reqwest::Method::POST, url).json(&json!({ "body": body })),
                "add issue comment",
            )
            .await?;
        Ok(IssueComment { id: comment.id, html_url: comment.html_url, body: comment.body })
    }

    async fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
    ) -> Result<Issue, ProviderError> {
        let url = format!("{}/repos/{}/issues", repo.api_base(), repo.full_name());
        let body = json!({
            "title": issue.title,
            "body": issue.body,
            "labels": issue.labels,
        });
        let created: GhIssue = self
            .send(self.request(reqwest::Method::POST, url).json(&body), "create issue")
            .await?;
        Ok(Issue {
            number: created.number,
            html_url: created.html_url,
            title: created.title,
            state: created.state,
        })
    }

    async fn update_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Issue, ProviderError> {
        let url = format!("{}/repos/{}/issues/{number}", repo.api_base(), repo.full_name());
        let mut patch = serde_json::Map::new();
        if let Some(title) = title {
            patch.insert("title".into(), json!(title));
        }
        if let Some(body) = body {
            patch.insert("body".into(), json!(body));
        }
        let updated: GhIssue = self
            .send(self.request(reqwest::Method::PATCH, url).json(&patch), "update issue")
            .await?;
        Ok(Issue {
            number: updated.number,
            html_url: updated.html_url,
            title: updated.title,
            state: updated.state,
        })
    }

    async fn add_pr_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ProviderError> {
        // PRs share the issue comment stream.
        self.add_issue_comment(repo, number, body).await
    }

    async fn compare(
        &self,
        repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<CompareResult, ProviderError> {
        let url = format!(
            "{}/repos/{}/compare/{}...{}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(base),
            urlencoding::encode(head),
        );
        let cmp: GhCompare = self.send(self.request(reqwest::Method::GET, url), "compare").await?;
        Ok(CompareResult {
            ahead_by: cmp.ahead_by,
            behind_by: cmp.behind_by,
            files: cmp
                .files
                .into_iter()
                .map(|f| crate::api::DiffFile {
                    filename: f.filename,
                    status: f.status,
                    additions: f.additions,
                    deletions: f.deletions,
                    patch: f.patch,
                })
                .collect(),
        })
    }

    async fn create_branch(
        &self,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<(), ProviderError> {
        // Resolve the source ref to a sha.
        let url = format!(
            "{}/repos/{}/commits/{}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(from_ref),
        );
        #[derive(Deserialize)]
        struct GhCommit {
            sha: String,
        }
        let commit: GhCommit =
            self.send(self.request(reqwest::Method::GET, url), "resolve ref").await?;

        let url = format!("{}/repos/{}/git/refs", repo.api_base(), repo.full_name());
        let body = json!({ "ref": format!("refs/heads/{name}"), "sha": commit.sha });
        let result: Result<serde_json::Value, ProviderError> = self
            .send(self.request(reqwest::Method::POST, url).json(&body), "create branch")
            .await;
        match result {
            Ok(_) => Ok(()),
            // 422 "Reference already exists" — idempotent for setup.
            Err(e) if e.kind == crate::error::ProviderErrorKind::Validation
                && e.message.contains("already exists") =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_branch(&self, repo: &RepoRef, name: &str) -> Result<(), ProviderError> {
        let url = format!(
            "{}/repos/{}/git/refs/heads/{}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(name),
        );
        let response = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("delete branch: {e}")))?;
        let status = response.status();
        if status.is_success() || status.as_u16() == 404 || status.as_u16() == 422 {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(
            status.as_u16(),
            format!("delete branch: {}", ambient_core::short(&body, 200)),
            None,
        ))
    }

    async fn put_file(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            repo.api_base(),
            repo.full_name(),
            urlencoding::encode(path).replace("%2F", "/"),
        );
        // Updating an existing file requires its blob sha.
        let existing_sha = match self.get_blob(repo, branch, path).await {
            Ok(blob) => blob.sha,
            Err(e) if e.kind == crate::error::ProviderErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        let mut body = json!({
            "message": message,
            "branch": branch,
            "content": base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
        });
        if let Some(sha) = existing_sha {
            body["sha"] = json!(sha);
        }
        let _: serde_json::Value = self
            .send(self.request(reqwest::Method::PUT, url).json(&body), "put file")
            .await?;
        Ok(())
    }

    async fn create_gist(
        &self,
        description: &str,
        files: BTreeMap<String, GistFile>,
        public: bool,
    ) -> Result<String, ProviderError> {
        let files_json: serde_json::Map<String, serde_json::Value> = files
            .into_iter()
            .map(|(name, file)| (name, json!({ "content": file.content })))
            .collect();
        let body = json!({
            "description": description,
            "public": public,
            "files": files_json,
        });
        let gist: GhGist = self
            .send(
                self.request(reqwest::Method::POST, "https://api.github.com/gists".to_string())
                    .json(&body),
                "create gist",
            )
            .await?;
        Ok(gist.html_url)
    }
}
