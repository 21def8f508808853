// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Naming rules for cluster objects and repo URLs.
//!
//! Session names double as DNS-1123 labels and prefix every derived
//! object name, so they are slugged aggressively and kept short.

/// Maximum length of a generated session name, suffix included.
const SESSION_NAME_MAX: usize = 40;

/// Derive a session name from its display name (or prompt): lowercase
/// alphanumeric tokens joined with `-`, at most three tokens of at most
/// four characters each, plus a random suffix for uniqueness.
pub fn session_name(display_name: &str, suffix: &str) -> String {
    let slug = slugify(display_name, 3, 4);
    let name = if slug.is_empty() {
        format!("session-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    };
    truncate_label(&name, SESSION_NAME_MAX)
}

/// Lowercase `input`, collapse non-alphanumeric runs to `-`, keep the
/// first `max_tokens` tokens truncated to `max_token_len` characters.
pub fn slugify(input: &str, max_tokens: usize, max_token_len: usize) -> String {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .take(max_tokens)
        .map(|t| &t[..t.len().min(max_token_len)])
        .collect::<Vec<_>>()
        .join("-")
}

fn truncate_label(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    name[..max].trim_end_matches('-').to_string()
}

/// Random lowercase-alphanumeric suffix for generated names.
pub fn random_suffix(len: usize) -> String {
    const ALPHABET: [char; 36] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
        'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x',
        'y', 'z',
    ];
    nanoid::nanoid!(len, &ALPHABET)
}

/// Workspace volume claim for a session.
pub fn workspace_pvc_name(session: &str) -> String {
    format!("ambient-workspace-{session}")
}

/// The session's runner job.
pub fn job_name(session: &str) -> String {
    format!("{session}-job")
}

/// The on-demand content sidecar pod.
pub fn content_pod_name(session: &str) -> String {
    format!("temp-content-{session}")
}

/// The service selecting the content sidecar. Shares the pod name so the
/// in-cluster URL is predictable from the session name alone.
pub fn content_service_name(session: &str) -> String {
    content_pod_name(session)
}

/// Normalize a git remote URL for comparison and provider detection:
/// `git@host:owner/repo.git` becomes `https://host/owner/repo`, trailing
/// `.git` and `/` are dropped, and the scheme+host are lowercased.
pub fn normalize_git_url(url: &str) -> String {
    let url = url.trim();
    let url = if let Some(rest) = url.strip_prefix("git@") {
        match rest.split_once(':') {
            Some((host, path)) => format!("https://{host}/{path}"),
            None => format!("https://{rest}"),
        }
    } else {
        url.to_string()
    };
    let url = url.trim_end_matches('/').trim_end_matches(".git").trim_end_matches('/');

    // Lowercase only scheme and host; path segments stay case-sensitive.
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            let mut out = format!("{}://{}", scheme.to_lowercase(), host.to_lowercase());
            if !path.is_empty() {
                out.push('/');
                out.push_str(path);
            }
            out
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
