// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn kube_api_error(code: u16) -> kube::Error {
    kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".into(),
        message: "boom".into(),
        reason: String::new(),
        code,
    })
}

#[parameterized(
    unauthorized = { 401, ErrorKind::Unauthenticated },
    forbidden = { 403, ErrorKind::Forbidden },
    missing = { 404, ErrorKind::NotFound },
    conflict = { 409, ErrorKind::Conflict },
    unprocessable = { 422, ErrorKind::SemanticValidation },
    server = { 503, ErrorKind::TransientCluster },
)]
fn kube_errors_map_to_kinds(code: u16, kind: ErrorKind) {
    let err: GatewayError = kube_api_error(code).into();
    assert_eq!(err.0.code, kind);
}

#[test]
fn cluster_not_found_maps_to_not_found() {
    let err: GatewayError =
        ambient_cluster::ClusterError::NotFound("project \"kube-system\" not found".into()).into();
    assert_eq!(err.0.code, ErrorKind::NotFound);
}

#[test]
fn provider_errors_keep_remediation() {
    let provider = ambient_providers::ProviderError::from_status(403, "no access", None);
    let err: GatewayError = provider.into();
    assert_eq!(err.0.code, ErrorKind::Forbidden);
    assert!(err.0.remediation.as_deref().unwrap_or("").contains("token"));
}

#[test]
fn response_body_shape() {
    let err = GatewayError::not_found("project missing").with_remediation("create it first");
    let json = serde_json::to_value(&err.0).unwrap();
    assert_eq!(json["error"], "project missing");
    assert_eq!(json["code"], "not_found");
    assert_eq!(json["remediation"], "create it first");
}
