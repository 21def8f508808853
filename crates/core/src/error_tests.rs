// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    validation = { ErrorKind::Validation, 400 },
    semantic = { ErrorKind::SemanticValidation, 422 },
    unauthenticated = { ErrorKind::Unauthenticated, 401 },
    forbidden = { ErrorKind::Forbidden, 403 },
    not_found = { ErrorKind::NotFound, 404 },
    conflict = { ErrorKind::Conflict, 409 },
    precondition = { ErrorKind::PreconditionFailed, 412 },
    rate_limited = { ErrorKind::RateLimited, 429 },
    transient = { ErrorKind::TransientCluster, 503 },
    provider = { ErrorKind::Provider, 502 },
    timeout = { ErrorKind::Timeout, 504 },
    internal = { ErrorKind::Internal, 500 },
)]
fn kind_maps_to_status(kind: ErrorKind, status: u16) {
    assert_eq!(kind.http_status(), status);
}

#[test]
fn only_transient_cluster_is_retryable() {
    assert!(ErrorKind::TransientCluster.is_retryable());
    assert!(!ErrorKind::Provider.is_retryable());
    assert!(!ErrorKind::Timeout.is_retryable());
}

#[test]
fn api_error_serializes_without_empty_remediation() {
    let err = ApiError::not_found("project missing");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["code"], "not_found");
    assert!(json.get("remediation").is_none());

    let err = err.with_remediation("create the project first");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["remediation"], "create the project first");
}
