// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::ProviderErrorKind;

#[test]
fn all_successes_aggregate_to_success() {
    let out = aggregate_results(vec![
        ("https://github.com/a/x".to_string(), Ok(1)),
        ("https://gitlab.com/b/y".to_string(), Ok(2)),
    ]);
    assert!(out.success);
    assert_eq!(out.repos.len(), 2);
    assert_eq!(out.repos[1].result, Some(2));
}

#[test]
fn one_failure_fails_the_aggregate_but_keeps_others() {
    let out = aggregate_results(vec![
        ("https://github.com/a/x".to_string(), Ok(1)),
        (
            "https://gitlab.com/b/y".to_string(),
            Err(ProviderError::from_status(404, "missing", None)),
        ),
    ]);
    assert!(!out.success);
    assert_eq!(out.repos[0].result, Some(1));
    let err = out.repos[1].error.as_ref().unwrap();
    assert_eq!(err.kind, ProviderErrorKind::NotFound);
    assert!(!err.remediation.is_empty());
}

#[test]
fn empty_input_is_vacuously_successful() {
    let out = aggregate_results::<()>(vec![]);
    assert!(out.success);
    assert!(out.repos.is_empty());
}
