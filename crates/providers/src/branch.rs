// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic working-branch naming.
//!
//! Resolution depends only on (user branch, allowProtectedWork, session id,
//! session display name); both the gateway (for display at admission) and
//! the operator (before scheduling the job) call the same function and
//! must agree.

use ambient_core::naming::slugify;

/// Branches never worked on directly unless explicitly allowed.
pub const PROTECTED_BRANCHES: &[&str] = &[
    "main",
    "master",
    "develop",
    "dev",
    "development",
    "production",
    "prod",
    "staging",
    "stage",
    "qa",
    "test",
    "stable",
];

/// Prefix for branches generated to shield a protected branch.
pub const WORK_BRANCH_PREFIX: &str = "work";

/// Inputs to branch resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchInput<'a> {
    /// The user-supplied working branch, if any.
    pub working_branch: Option<&'a str>,
    pub allow_protected_work: bool,
    pub session_id: &'a str,
    pub session_display_name: &'a str,
}

/// True for branches in the protected set.
pub fn is_protected(branch: &str) -> bool {
    PROTECTED_BRANCHES.contains(&branch)
}

/// Resolve the effective working branch:
///
/// 1. A non-empty, non-protected user branch is used verbatim.
/// 2. A protected branch with `allowProtectedWork` is used verbatim.
/// 3. A protected branch without it becomes `work/<branch>/<sessionId>`.
/// 4. An empty branch derives from the display name: lowercase, collapse
///    non-alphanumeric runs to `-`, first three tokens, prefixed with
///    `ambient-`; when no tokens survive, the session id is used instead.
pub fn resolve_working_branch(input: &BranchInput<'_>) -> String {
    match input.working_branch.map(str::trim).filter(|b| !b.is_empty()) {
        Some(branch) if !is_protected(branch) => branch.to_string(),
        Some(branch) if input.allow_protected_work => branch.to_string(),
        Some(branch) => format!("{WORK_BRANCH_PREFIX}/{branch}/{}", input.session_id),
        None => {
            let slug = slugify(input.session_display_name, 3, usize::MAX);
            if slug.is_empty() {
                format!("ambient-{}", input.session_id)
            } else {
                format!("ambient-{slug}")
            }
        }
    }
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
