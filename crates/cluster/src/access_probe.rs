// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role probing via SelfSubjectAccessReview.
//!
//! The probe runs under the caller's (impersonated) client and therefore
//! can only ever reveal the caller's own access, never other subjects'.

use crate::client::ClusterError;
use crate::crd::GROUP;
use ambient_core::Role;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::api::PostParams;
use kube::{Api, Client};

/// Sentinel probes, highest role first: admin can update projectsettings,
/// edit can create sessions, view can get sessions.
const PROBES: &[(Role, &str, &str)] = &[
    (Role::Admin, "update", "projectsettings"),
    (Role::Edit, "create", "agenticsessions"),
    (Role::View, "get", "agenticsessions"),
];

async fn allowed(
    client: &Client,
    namespace: &str,
    verb: &str,
    resource: &str,
) -> Result<bool, ClusterError> {
    let api: Api<SelfSubjectAccessReview> = Api::all(client.clone());
    let review = SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                namespace: Some(namespace.to_string()),
                group: Some(GROUP.to_string()),
                resource: Some(resource.to_string()),
                verb: Some(verb.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = api.create(&PostParams::default(), &review).await?;
    Ok(result.status.map(|s| s.allowed).unwrap_or(false))
}

/// The caller's highest role on the project, or None when even read
/// access is denied.
pub async fn highest_role(
    client: &Client,
    namespace: &str,
) -> Result<Option<Role>, ClusterError> {
    for (role, verb, resource) in PROBES {
        if allowed(client, namespace, verb, resource).await? {
            return Ok(Some(*role));
        }
    }
    Ok(None)
}
