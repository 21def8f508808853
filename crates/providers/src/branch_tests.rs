// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::test_support::strategies::arb_display_name;
use proptest::prelude::*;
use yare::parameterized;

fn input<'a>(
    working_branch: Option<&'a str>,
    allow: bool,
    session_id: &'a str,
    display: &'a str,
) -> BranchInput<'a> {
    BranchInput {
        working_branch,
        allow_protected_work: allow,
        session_id,
        session_display_name: display,
    }
}

#[parameterized(
    custom_branch = { Some("feature/login"), false, "feature/login" },
    protected_allowed = { Some("main"), true, "main" },
    protected_blocked = { Some("main"), false, "work/main/abc123" },
    staging_blocked = { Some("staging"), false, "work/staging/abc123" },
    whitespace_trimmed = { Some("  feature/x  "), false, "feature/x" },
)]
fn resolution_rules(branch: Option<&str>, allow: bool, expected: &str) {
    let input = input(branch, allow, "abc123", "ignored");
    assert_eq!(resolve_working_branch(&input), expected);
}

#[test]
fn empty_branch_derives_from_display_name() {
    let input = input(None, false, "abc123", "Summarize repo");
    assert_eq!(resolve_working_branch(&input), "ambient-summarize-repo");
}

#[test]
fn display_name_keeps_first_three_tokens() {
    let input = input(None, false, "abc123", "Fix The Login Page Bug");
    assert_eq!(resolve_working_branch(&input), "ambient-fix-the-login");
}

#[test]
fn degenerate_display_name_falls_back_to_session_id() {
    let input = input(Some(""), false, "abc123", "!!! ***");
    assert_eq!(resolve_working_branch(&input), "ambient-abc123");
}

#[test]
fn every_protected_branch_is_shielded() {
    for branch in PROTECTED_BRANCHES {
        let input = input(Some(branch), false, "s1", "x");
        let resolved = resolve_working_branch(&input);
        assert_eq!(resolved, format!("work/{branch}/s1"));
        assert_ne!(resolved, *branch);
    }
}

proptest! {
    /// Determinism: the result depends only on the four inputs.
    #[test]
    fn resolution_is_deterministic(
        branch in proptest::option::of("[a-zA-Z/_-]{0,12}"),
        allow in any::<bool>(),
        session_id in "[a-z0-9]{4,10}",
        display in arb_display_name(),
    ) {
        let a = resolve_working_branch(&input(branch.as_deref(), allow, &session_id, &display));
        let b = resolve_working_branch(&input(branch.as_deref(), allow, &session_id, &display));
        prop_assert_eq!(a, b);
    }

    /// A protected branch is never returned unless explicitly allowed.
    #[test]
    fn protected_branches_never_leak(
        branch in proptest::sample::select(PROTECTED_BRANCHES),
        session_id in "[a-z0-9]{4,10}",
        display in arb_display_name(),
    ) {
        let resolved =
            resolve_working_branch(&input(Some(branch), false, &session_id, &display));
        prop_assert!(!is_protected(&resolved));
    }
}
