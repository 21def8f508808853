// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    github_https = { "https://github.com/acme/app", Provider::Github, "github.com", "acme", "app" },
    github_git_suffix = { "https://github.com/acme/app.git", Provider::Github, "github.com", "acme", "app" },
    github_ssh = { "git@github.com:acme/app.git", Provider::Github, "github.com", "acme", "app" },
    enterprise = { "https://github.example.com/acme/app", Provider::Github, "github.example.com", "acme", "app" },
    gitlab = { "https://gitlab.com/acme/app", Provider::Gitlab, "gitlab.com", "acme", "app" },
    gitlab_nested = { "https://gitlab.com/group/sub/app", Provider::Gitlab, "gitlab.com", "group/sub", "app" },
    unknown_host = { "https://git.example.com/acme/app", Provider::Github, "git.example.com", "acme", "app" },
)]
fn parse_repo_urls(url: &str, provider: Provider, host: &str, owner: &str, repo: &str) {
    let parsed = RepoRef::parse(url).unwrap();
    assert_eq!(parsed.provider, provider);
    assert_eq!(parsed.host, host);
    assert_eq!(parsed.owner, owner);
    assert_eq!(parsed.repo, repo);
}

#[parameterized(
    bare_host = { "https://github.com" },
    one_segment = { "https://github.com/acme" },
    not_a_url = { "acme/app" },
)]
fn parse_rejects_incomplete_urls(url: &str) {
    assert!(RepoRef::parse(url).is_err());
}

#[test]
fn api_base_per_provider() {
    let gh = RepoRef::parse("https://github.com/acme/app").unwrap();
    assert_eq!(gh.api_base(), "https://api.github.com");

    let ghe = RepoRef::parse("https://github.corp.io/acme/app").unwrap();
    assert_eq!(ghe.api_base(), "https://github.corp.io/api/v3");

    let gl = RepoRef::parse("https://gitlab.com/acme/app").unwrap();
    assert_eq!(gl.api_base(), "https://gitlab.com/api/v4");
}

#[test]
fn issue_url_parses_github_form() {
    let (repo, number) = parse_issue_url("https://github.com/acme/app/issues/42").unwrap();
    assert_eq!(repo.full_name(), "acme/app");
    assert_eq!(number, 42);
}

#[test]
fn issue_url_parses_gitlab_form() {
    let (repo, number) = parse_issue_url("https://gitlab.com/grp/app/-/issues/7").unwrap();
    assert_eq!(repo.provider, Provider::Gitlab);
    assert_eq!(number, 7);
}

#[parameterized(
    no_issue_path = { "https://github.com/acme/app/pull/42" },
    bad_number = { "https://github.com/acme/app/issues/abc" },
    empty = { "" },
)]
fn issue_url_rejects_invalid(url: &str) {
    assert!(parse_issue_url(url).is_err());
}
