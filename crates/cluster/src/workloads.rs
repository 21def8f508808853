// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction of the Kubernetes objects a session owns.
//!
//! Pure builders shared by the operator (reconcile) and the gateway
//! (on-demand content sidecars): given the session and resolved
//! configuration they return fully-formed objects with owner references,
//! so both components and the tests share one source of truth for shapes.

use crate::crd::AgenticSession;
use ambient_core::naming::{content_pod_name, content_service_name, job_name, workspace_pvc_name};
use ambient_core::session::ResourceOverrides;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvFromSource, EnvVar, HTTPGetAction, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, Pod, PodSpec, PodTemplateSpec,
    Probe, ResourceRequirements, SecretEnvSource, Service, ServicePort, ServiceSpec, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use kube::Resource;
use std::collections::BTreeMap;

/// Label carrying the owning session name on derived objects.
pub const SESSION_LABEL: &str = "ambient-code.io/session";

/// Label distinguishing the runner job from the content sidecar.
pub const COMPONENT_LABEL: &str = "ambient-code.io/component";

/// Annotation holding the content sidecar's time-to-live in seconds.
pub const CONTENT_TTL_ANNOTATION: &str = "ambient-code.io/content-ttl-seconds";

/// Default sidecar TTL when none is requested.
pub const DEFAULT_CONTENT_TTL_SECS: u64 = 3600;

/// Default workspace volume size.
const DEFAULT_WORKSPACE_SIZE: &str = "1Gi";

fn quantities(pairs: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
    pairs.iter().map(|(k, v)| (k.to_string(), Quantity(v.to_string()))).collect()
}

/// Owner reference pointing at the session, so volume/job/sidecar cascade
/// on delete.
pub fn session_owner_ref(session: &AgenticSession) -> OwnerReference {
    OwnerReference {
        api_version: AgenticSession::api_version(&()).into_owned(),
        kind: AgenticSession::kind(&()).into_owned(),
        name: session.meta().name.clone().unwrap_or_default(),
        uid: session.meta().uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn session_labels(session_name: &str, component: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(SESSION_LABEL.to_string(), session_name.to_string());
    labels.insert(COMPONENT_LABEL.to_string(), component.to_string());
    labels
}

/// The session's workspace volume claim.
pub fn build_workspace_pvc(session: &AgenticSession) -> PersistentVolumeClaim {
    let name = session.meta().name.clone().unwrap_or_default();
    let overrides = session.spec.resource_overrides.clone().unwrap_or_default();
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(workspace_pvc_name(&name)),
            namespace: session.meta().namespace.clone(),
            labels: Some(session_labels(&name, "workspace")),
            owner_references: Some(vec![session_owner_ref(session)]),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: overrides.storage_class,
            resources: Some(VolumeResourceRequirements {
                requests: Some(quantities(&[("storage", DEFAULT_WORKSPACE_SIZE)])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Compact manifest handed to the runner via one env var.
pub fn session_manifest(session: &AgenticSession) -> serde_json::Value {
    let name = session.meta().name.clone().unwrap_or_default();
    let project = session.meta().namespace.clone().unwrap_or_default();
    let repos: Vec<serde_json::Value> = session
        .status
        .as_ref()
        .map(|s| {
            s.reconciled_repos
                .iter()
                .map(|r| serde_json::json!({ "url": r.url, "branch": r.branch }))
                .collect()
        })
        .unwrap_or_default();
    serde_json::json!({
        "name": name,
        "project": project,
        "prompt": session.spec.prompt,
        "interactive": session.spec.interactive,
        "timeout": session.spec.timeout,
        "repos": repos,
        "mainRepoIndex": session.spec.main_repo_index.unwrap_or(0),
        "workflow": session.spec.active_workflow,
    })
}

fn workload_resources(overrides: &ResourceOverrides) -> ResourceRequirements {
    let requests = quantities(&[
        ("cpu", overrides.cpu.as_deref().unwrap_or("100m")),
        ("memory", overrides.memory.as_deref().unwrap_or("128Mi")),
    ]);
    let limits = quantities(&[
        ("cpu", overrides.cpu.as_deref().unwrap_or("500m")),
        ("memory", overrides.memory.as_deref().unwrap_or("512Mi")),
    ]);
    ResourceRequirements { requests: Some(requests), limits: Some(limits), ..Default::default() }
}

/// The runner job. One pod, never restarted by Kubernetes; restarts are a
/// control-plane decision that recreates the job.
pub fn build_runner_job(session: &AgenticSession, runner_secret: Option<&str>) -> Job {
    let name = session.meta().name.clone().unwrap_or_default();
    let spec = &session.spec;

    let mut env = vec![
        EnvVar {
            name: "AMBIENT_SESSION_MANIFEST".into(),
            value: Some(session_manifest(session).to_string()),
            ..Default::default()
        },
        EnvVar {
            name: "LLM_MODEL".into(),
            value: Some(spec.llm_settings.model.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "LLM_TEMPERATURE".into(),
            value: Some(spec.llm_settings.temperature.to_string()),
            ..Default::default()
        },
        EnvVar {
            name: "LLM_MAX_TOKENS".into(),
            value: Some(spec.llm_settings.max_tokens.to_string()),
            ..Default::default()
        },
        EnvVar {
            name: "STATE_BASE_DIR".into(),
            value: Some(state_base_dir()),
            ..Default::default()
        },
    ];
    for (key, value) in &spec.environment_variables {
        env.push(EnvVar { name: key.clone(), value: Some(value.clone()), ..Default::default() });
    }

    let env_from = runner_secret.map(|secret| {
        vec![EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: secret.to_string(),
                optional: Some(true),
            }),
            ..Default::default()
        }]
    });

    let overrides = spec.resource_overrides.clone().unwrap_or_default();
    let container = Container {
        name: "runner".into(),
        image: Some(runner_image()),
        image_pull_policy: Some(image_pull_policy()),
        env: Some(env),
        env_from,
        resources: Some(workload_resources(&overrides)),
        volume_mounts: Some(vec![VolumeMount {
            name: "workspace".into(),
            mount_path: state_base_dir(),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Job {
        metadata: ObjectMeta {
            name: Some(job_name(&name)),
            namespace: session.meta().namespace.clone(),
            labels: Some(session_labels(&name, "runner")),
            owner_references: Some(vec![session_owner_ref(session)]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(session_labels(&name, "runner")),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    restart_policy: Some("Never".into()),
                    priority_class_name: overrides.priority_class,
                    containers: vec![container],
                    volumes: Some(vec![Volume {
                        name: "workspace".into(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: workspace_pvc_name(&name),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// The on-demand content sidecar pod serving the workspace over HTTP.
pub fn build_content_pod(session: &AgenticSession, ttl_secs: u64) -> Pod {
    let name = session.meta().name.clone().unwrap_or_default();
    let mut annotations = BTreeMap::new();
    annotations.insert(CONTENT_TTL_ANNOTATION.to_string(), ttl_secs.to_string());

    Pod {
        metadata: ObjectMeta {
            name: Some(content_pod_name(&name)),
            namespace: session.meta().namespace.clone(),
            labels: Some(session_labels(&name, "content")),
            annotations: Some(annotations),
            owner_references: Some(vec![session_owner_ref(session)]),
            ..Default::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("Never".into()),
            containers: vec![Container {
                name: "content".into(),
                image: Some(content_service_image()),
                image_pull_policy: Some(image_pull_policy()),
                env: Some(vec![
                    EnvVar {
                        name: "CONTENT_SERVICE_MODE".into(),
                        value: Some("true".into()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "STATE_BASE_DIR".into(),
                        value: Some(state_base_dir()),
                        ..Default::default()
                    },
                ]),
                ports: Some(vec![ContainerPort {
                    container_port: 8080,
                    name: Some("http".into()),
                    ..Default::default()
                }]),
                readiness_probe: Some(Probe {
                    http_get: Some(HTTPGetAction {
                        path: Some("/health".into()),
                        port: IntOrString::Int(8080),
                        ..Default::default()
                    }),
                    initial_delay_seconds: Some(1),
                    period_seconds: Some(5),
                    ..Default::default()
                }),
                volume_mounts: Some(vec![VolumeMount {
                    name: "workspace".into(),
                    mount_path: state_base_dir(),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            volumes: Some(vec![Volume {
                name: "workspace".into(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: workspace_pvc_name(&name),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Service selecting the content sidecar by the session-scoped label.
pub fn build_content_service(session: &AgenticSession) -> Service {
    let name = session.meta().name.clone().unwrap_or_default();
    Service {
        metadata: ObjectMeta {
            name: Some(content_service_name(&name)),
            namespace: session.meta().namespace.clone(),
            labels: Some(session_labels(&name, "content")),
            owner_references: Some(vec![session_owner_ref(session)]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(session_labels(&name, "content")),
            ports: Some(vec![ServicePort {
                name: Some("http".into()),
                port: 8080,
                target_port: Some(IntOrString::Int(8080)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Base directory for workspace volumes inside pods (`STATE_BASE_DIR`).
pub fn state_base_dir() -> String {
    std::env::var("STATE_BASE_DIR").unwrap_or_else(|_| "/workspace".to_string())
}

/// Image for the session runner job (`AMBIENT_RUNNER_IMAGE`).
pub fn runner_image() -> String {
    std::env::var("AMBIENT_RUNNER_IMAGE")
        .unwrap_or_else(|_| "ghcr.io/ambient-code/runner:latest".to_string())
}

/// Image for the per-session content sidecar (`CONTENT_SERVICE_IMAGE`).
pub fn content_service_image() -> String {
    std::env::var("CONTENT_SERVICE_IMAGE")
        .unwrap_or_else(|_| "ghcr.io/ambient-code/gateway:latest".to_string())
}

/// `Always` when requested via `IMAGE_PULL_POLICY`, default `IfNotPresent`.
pub fn image_pull_policy() -> String {
    match std::env::var("IMAGE_PULL_POLICY") {
        Ok(v) if v.eq_ignore_ascii_case("always") => "Always".to_string(),
        _ => "IfNotPresent".to_string(),
    }
}

#[cfg(test)]
#[path = "workloads_tests.rs"]
mod tests;
