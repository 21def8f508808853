// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregation of per-repo provider results.
//!
//! Sessions declare several repos, possibly on different providers; an
//! operation across them succeeds only when every repo succeeds, and the
//! aggregate keeps each repo's own error and remediation.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// Outcome for one repo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RepoResult<T> {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

/// Aggregate outcome across repos; `success` is the conjunction of
/// per-repo successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRepoResult<T> {
    pub success: bool,
    pub repos: Vec<RepoResult<T>>,
}

/// Combine per-repo outcomes.
pub fn aggregate_results<T>(
    results: Vec<(String, Result<T, ProviderError>)>,
) -> MultiRepoResult<T> {
    let repos: Vec<RepoResult<T>> = results
        .into_iter()
        .map(|(url, result)| match result {
            Ok(value) => RepoResult { url, result: Some(value), error: None },
            Err(error) => RepoResult { url, result: None, error: Some(error) },
        })
        .collect();
    let success = repos.iter().all(|r| r.error.is_none());
    MultiRepoResult { success, repos }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
