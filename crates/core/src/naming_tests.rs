// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn session_name_slugs_display_name() {
    let name = session_name("Summarize the repository", "x7k2p");
    assert_eq!(name, "summ-the-repo-x7k2p");
}

#[test]
fn session_name_falls_back_when_no_tokens_survive() {
    let name = session_name("!!! ???", "x7k2p");
    assert_eq!(name, "session-x7k2p");
}

#[test]
fn session_name_is_dns_safe_and_bounded() {
    let name = session_name(
        "A very long and winded description of what this session should do",
        "abcde",
    );
    assert!(name.len() <= 40);
    assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    assert!(!name.ends_with('-'));
}

#[test]
fn slugify_handles_unicode_separators() {
    assert_eq!(slugify("Fix the émission bug", 3, 10), "fix-the-mission");
}

#[parameterized(
    ssh = { "git@github.com:Acme/App.git", "https://github.com/Acme/App" },
    https_git = { "https://github.com/acme/app.git", "https://github.com/acme/app" },
    trailing_slash = { "https://github.com/acme/app/", "https://github.com/acme/app" },
    upper_host = { "HTTPS://GitHub.com/Acme/app", "https://github.com/Acme/app" },
    gitlab = { "https://gitlab.com/group/sub/project", "https://gitlab.com/group/sub/project" },
)]
fn normalize_git_url_cases(input: &str, expected: &str) {
    assert_eq!(normalize_git_url(input), expected);
}

#[test]
fn object_names_derive_from_session() {
    assert_eq!(workspace_pvc_name("summ-repo-x7k2p"), "ambient-workspace-summ-repo-x7k2p");
    assert_eq!(job_name("summ-repo-x7k2p"), "summ-repo-x7k2p-job");
    assert_eq!(content_pod_name("summ-repo-x7k2p"), "temp-content-summ-repo-x7k2p");
    assert_eq!(content_service_name("s1"), content_pod_name("s1"));
}
