// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitLab adapter (gitlab.com and self-hosted).
//!
//! Projects are addressed by their URL-encoded `group/project` path.
//! Merge requests take the place of pull requests; notes take the place
//! of comments.

use crate::api::{
    Blob, Branch, CompareResult, DiffFile, GitProvider, Issue, IssueComment, NewIssue,
    NewPullRequest, PullRequest, RepoFork, TreeEntry,
};
use crate::detect::RepoRef;
use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

/// Per-request GitLab adapter.
pub struct GitlabClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitlabClient {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self { http, token }
    }

    fn project_path(repo: &RepoRef) -> String {
        urlencoding::encode(&repo.full_name()).into_owned()
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
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
    let reset = headers.get("ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    Utc.timestamp_opt(reset, 0).single()
}

#[derive(Deserialize)]
struct GlBranch {
    name: String,
    #[serde(default)]
    protected: bool,
    commit: GlCommitRef,
}

#[derive(Deserialize)]
struct GlCommitRef {
    id: String,
}

#[derive(Deserialize)]
struct GlTreeEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    id: String,
}

#[derive(Deserialize)]
struct GlProject {
    path_with_namespace: String,
    http_url_to_repo: String,
    namespace: GlNamespace,
}

#[derive(Deserialize)]
struct GlNamespace {
    full_path: String,
}

#[derive(Deserialize)]
struct GlMergeRequest {
    iid: u64,
    web_url: String,
    title: String,
    state: String,
}

#[derive(Deserialize)]
struct GlIssue {
    iid: u64,
    web_url: String,
    title: String,
    state: String,
}

#[derive(Deserialize)]
struct GlNote {
    id: u64,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct GlCompare {
    #[serde(default)]
    diffs: Vec<GlDiff>,
}

#[derive(Deserialize)]
struct GlDiff {
    new_path: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    deleted_file: bool,
    #[serde(default)]
    diff: String,
}

#[async_trait]
impl GitProvider for GitlabClient {
    async fn list_branches(&self, repo: &RepoRef) -> Result<Vec<Branch>, ProviderError> {
        let url = format!(
            "{}/projects/{}/repository/branches?per_page=100",
            repo.api_base(),
            Self::project_path(repo)
        );
        let branches: Vec<GlBranch> =
            self.send(self.request(reqwest::Method::GET, url), "list branches").await?;
        Ok(branches
            .into_iter()
            .map(|b| Branch { name: b.name, protected: b.protected, sha: Some(b.commit.id) })
            .collect())
    }

    async fn get_tree(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError> {
        let url = format!(
            "{}/projects/{}/repository/tree?ref={}&path={}&per_page=100",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(git_ref),
            urlencoding::encode(path),
        );
        let entries: Vec<GlTreeEntry> =
            self.send(self.request(reqwest::Method::GET, url), "read tree").await?;
        Ok(entries
            .into_iter()
            .map(|e| TreeEntry {
                name: e.name,
                path: e.path,
                entry_type: if e.entry_type == "tree" { "dir".into() } else { "file".into() },
                size: None,
                sha: Some(e.id),
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
            "{}/projects/{}/repository/files/{}/raw?ref={}",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(path),
            urlencoding::encode(git_ref),
        );
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("read blob: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("read blob: {}", ambient_core::short(&body, 200)),
                None,
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::other(format!("read blob body: {e}")))?;
        Ok(Blob {
            path: path.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            size: bytes.len() as u64,
            sha: None,
        })
    }

    async fn list_user_forks(&self, repo: &RepoRef) -> Result<Vec<RepoFork>, ProviderError> {
        let url = format!(
            "{}/projects/{}/forks?owned=true&per_page=100",
            repo.api_base(),
            Self::project_path(repo)
        );
        let projects: Vec<GlProject> =
            self.send(self.request(reqwest::Method::GET, url), "list forks").await?;
        Ok(projects
            .into_iter()
            .map(|p| RepoFork {
                full_name: p.path_with_namespace,
                clone_url: p.http_url_to_repo,
                owner: p.namespace.full_path,
            })
            .collect())
    }

    async fn create_fork(&self, repo: &RepoRef) -> Result<RepoFork, ProviderError> {
        let url = format!("{}/projects/{}/fork", repo.api_base(), Self::project_path(repo));
        let forked: GlProject =
            self.send(self.request(reqwest::Method::POST, url), "create fork").await?;
        Ok(RepoFork {
            full_name: forked.path_with_namespace,
            clone_url: forked.http_url_to_repo,
            owner: forked.namespace.full_path,
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest, ProviderError> {
        let url =
            format!("{}/projects/{}/merge_requests", repo.api_base(), Self::project_path(repo));
        let body = json!({
            "title": request.title,
            "description": request.body,
            "source_branch": request.head,
            "target_branch": request.base,
        });
        let mr: GlMergeRequest = self
            .send(self.request(reqwest::Method::POST, url).json(&body), "create merge request")
            .await?;
        Ok(PullRequest { number: mr.iid, html_url: mr.web_url, title: mr.title, state: mr.state })
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<IssueComment>, ProviderError> {
        let url = format!(
            "{}/projects/{}/issues/{number}/notes?per_page=100",
            repo.api_base(),
            Self::project_path(repo)
        );
        let notes: Vec<GlNote> =
            self.send(self.request(reqwest::Method::GET, url), "list issue notes").await?;
        Ok(notes
            .into_iter()
            .map(|n| IssueComment { id: n.id, html_url: String::new(), body: n.body })
            .collect())
    }

    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, ProviderError> {
        let url = format!(
            "{}/projects/{}/issues/{number}/notes",
            repo.api_base(),
            Self::project_path(repo)
        );
        let note: GlNote = self
            .send(
                self.request(reqwest::Method::POST, url).json(&json!({ "body": body })),
                "add issue note",
            )
            .await?;
        Ok(IssueComment { id: note.id, html_url: String::new(), body: note.body })
    }

    async fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
    ) -> Result<Issue, ProviderError> {
        let url = format!("{}/projects/{}/issues", repo.api_base(), Self::project_path(repo));
        let body = json!({
            "title": issue.title,
            "description": issue.body,
            "labels": issue.labels.join(","),
        });
        let created: GlIssue = self
            .send(self.request(reqwest::Method::POST, url).json(&body), "create issue")
            .await?;
        Ok(Issue {
            number: created.iid,
            html_url: created.web_url,
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
        let url = format!(
            "{}/projects/{}/issues/{number}",
            repo.api_base(),
            Self::project_path(repo)
        );
        let mut patch = serde_json::Map::new();
        if let Some(title) = title {
            patch.insert("title".into(), json!(title));
        }
        if let Some(body) = body {
            patch.insert("description".into(), json!(body));
        }
        let updated: GlIssue = self
            .send(self.request(reqwest::Method::PUT, url).json(&patch), "update issue")
            .await?;
        Ok(Issue {
            number: updated.iid,
            html_url: updated.web_url,
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
        let url = format!(
            "{}/projects/{}/merge_requests/{number}/notes",
            repo.api_base(),
            Self::project_path(repo)
        );
        let note: GlNote = self
            .send(
                self.request(reqwest::Method::POST, url).json(&json!({ "body": body })),
                "add merge request note",
            )
            .await?;
        Ok(IssueComment { id: note.id, html_url: String::new(), body: note.body })
    }

    async fn create_branch(
        &self,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/projects/{}/repository/branches?branch={}&ref={}",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(name),
            urlencoding::encode(from_ref),
        );
        let result: Result<serde_json::Value, ProviderError> =
            self.send(self.request(reqwest::Method::POST, url), "create branch").await;
        match result {
            Ok(_) => Ok(()),
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
            "{}/projects/{}/repository/branches/{}",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(name),
        );
        let response = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("delete branch: {e}")))?;
        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
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
            "{}/projects/{}/repository/files/{}",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(path),
        );
        let body = json!({
            "branch": branch,
            "content": content,
            "commit_message": message,
        });
        // POST creates; a 400 "file already exists" means update via PUT.
        let created: Result<serde_json::Value, ProviderError> = self
            .send(self.request(reqwest::Method::POST, url.clone()).json(&body), "create file")
            .await;
        match created {
            Ok(_) => Ok(()),
            Err(e) if e.kind == crate::error::ProviderErrorKind::Validation => {
                let _: serde_json::Value = self
                    .send(self.request(reqwest::Method::PUT, url).json(&body), "update file")
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn compare(
        &self,
        repo: &RepoRef,
        base: &str,
        head: &str,
    ) -> Result<CompareResult, ProviderError> {
        let url = format!(
            "{}/projects/{}/repository/compare?from={}&to={}",
            repo.api_base(),
            Self::project_path(repo),
            urlencoding::encode(base),
            urlencoding::encode(head),
        );
        let cmp: GlCompare = self.send(self.request(reqwest::Method::GET, url), "compare").await?;
        let files: Vec<DiffFile> = cmp
            .diffs
            .into_iter()
            .map(|d| DiffFile {
                filename: d.new_path,
                status: if d.new_file {
                    "added".into()
                } else if d.deleted_file {
                    "removed".into()
                } else {
                    "modified".into()
                },
                additions: 0,
                deletions: 0,
                patch: Some(d.diff),
            })
            .collect();
        Ok(CompareResult { ahead_by: files.len() as u64, behind_by: 0, files })
    }
}
