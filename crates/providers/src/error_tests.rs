// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

#[parameterized(
    unauthorized = { 401, ProviderErrorKind::Auth },
    forbidden = { 403, ProviderErrorKind::Permissions },
    missing = { 404, ProviderErrorKind::NotFound },
    throttled = { 429, ProviderErrorKind::RateLimit },
    unprocessable = { 422, ProviderErrorKind::Validation },
    conflict = { 409, ProviderErrorKind::Validation },
    server = { 500, ProviderErrorKind::Other },
)]
fn status_classification(status: u16, kind: ProviderErrorKind) {
    assert_eq!(ProviderError::from_status(status, "boom", None).kind, kind);
}

#[test]
fn forbidden_with_reset_is_rate_limit() {
    let reset = Utc.timestamp_opt(1_700_000_000, 0).single();
    let err = ProviderError::from_status(403, "secondary limit", reset);
    assert_eq!(err.kind, ProviderErrorKind::RateLimit);
    assert_eq!(err.rate_limit_reset, reset);
    assert!(err.remediation.contains("retry after"));
}

#[test]
fn every_kind_carries_remediation() {
    for status in [401u16, 403, 404, 422, 429, 500] {
        let err = ProviderError::from_status(status, "x", None);
        assert!(!err.remediation.is_empty(), "no remediation for {status}");
    }
}

#[test]
fn api_kind_mapping() {
    assert_eq!(
        ProviderError::from_status(401, "x", None).api_kind(),
        ambient_core::ErrorKind::Unauthenticated
    );
    assert_eq!(
        ProviderError::from_status(500, "x", None).api_kind(),
        ambient_core::ErrorKind::Provider
    );
}
