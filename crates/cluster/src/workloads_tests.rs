// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ambient_core::session::{ReconciledRepo, ResourceOverrides, SessionSpec, SessionStatus};
use serial_test::serial;

fn session(name: &str, spec: SessionSpec) -> AgenticSession {
    let mut session = AgenticSession::new(name, spec.into());
    session.metadata.namespace = Some("acme".into());
    session.metadata.uid = Some("uid-1".into());
    session
}

#[test]
#[serial]
fn pvc_shape() {
    let s = session("s1", SessionSpec::default());
    let pvc = build_workspace_pvc(&s);
    assert_eq!(pvc.metadata.name.as_deref(), Some("ambient-workspace-s1"));
    assert_eq!(pvc.metadata.namespace.as_deref(), Some("acme"));

    let owner = &pvc.metadata.owner_references.as_ref().unwrap()[0];
    assert_eq!(owner.kind, "AgenticSession");
    assert_eq!(owner.name, "s1");
    assert_eq!(owner.controller, Some(true));

    let spec = pvc.spec.unwrap();
    assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteOnce"]);
    assert!(spec.storage_class_name.is_none());
}

#[test]
#[serial]
fn pvc_honors_storage_class_override() {
    let spec = SessionSpec {
        resource_overrides: Some(ResourceOverrides {
            storage_class: Some("fast-ssd".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let pvc = build_workspace_pvc(&session("s1", spec));
    assert_eq!(pvc.spec.unwrap().storage_class_name.as_deref(), Some("fast-ssd"));
}

#[test]
#[serial]
fn job_shape_and_defaults() {
    let s = session("s1", SessionSpec::default());
    let job = build_runner_job(&s, Some("ambient-runner-secrets"));
    assert_eq!(job.metadata.name.as_deref(), Some("s1-job"));

    let pod = job.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
    assert_eq!(pod.restart_policy.as_deref(), Some("Never"));

    let container = &pod.containers[0];
    let resources = container.resources.as_ref().unwrap();
    assert_eq!(resources.requests.as_ref().unwrap()["cpu"].0, "100m");
    assert_eq!(resources.requests.as_ref().unwrap()["memory"].0, "128Mi");
    assert_eq!(resources.limits.as_ref().unwrap()["cpu"].0, "500m");
    assert_eq!(resources.limits.as_ref().unwrap()["memory"].0, "512Mi");

    let env_from = container.env_from.as_ref().unwrap();
    assert_eq!(env_from[0].secret_ref.as_ref().unwrap().name, "ambient-runner-secrets");

    let mount = &container.volume_mounts.as_ref().unwrap()[0];
    assert_eq!(mount.mount_path, "/workspace");
}

#[test]
#[serial]
fn job_env_carries_llm_settings_and_manifest() {
    let mut s = session("s1", SessionSpec::builder().prompt("Summarize repo").build());
    s.status = Some(SessionStatus {
        reconciled_repos: vec![ReconciledRepo {
            url: "https://github.com/acme/app".into(),
            branch: "ambient-summarize-repo".into(),
            cloned_at: None,
        }],
        ..Default::default()
    });
    let job = build_runner_job(&s, None);
    let container = &job.spec.unwrap().template.spec.unwrap().containers[0];
    assert!(container.env_from.is_none());

    let env = container.env.as_ref().unwrap();
    let get = |name: &str| {
        env.iter().find(|e| e.name == name).and_then(|e| e.value.clone()).unwrap_or_default()
    };
    assert_eq!(get("LLM_MODEL"), "claude-sonnet-4-6");
    assert_eq!(get("LLM_TEMPERATURE"), "0.7");

    let manifest: serde_json::Value = serde_json::from_str(&get("AMBIENT_SESSION_MANIFEST")).unwrap();
    assert_eq!(manifest["prompt"], "Summarize repo");
    assert_eq!(manifest["repos"][0]["branch"], "ambient-summarize-repo");
}

#[test]
#[serial]
fn job_priority_class_override() {
    let spec = SessionSpec {
        resource_overrides: Some(ResourceOverrides {
            priority_class: Some("high".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let job = build_runner_job(&session("s1", spec), None);
    let pod = job.spec.unwrap().template.spec.unwrap();
    assert_eq!(pod.priority_class_name.as_deref(), Some("high"));
}

#[test]
#[serial]
fn content_pod_and_service_agree_on_labels() {
    let s = session("s1", SessionSpec::default());
    let pod = build_content_pod(&s, 600);
    let service = build_content_service(&s);

    assert_eq!(pod.metadata.name.as_deref(), Some("temp-content-s1"));
    assert_eq!(service.metadata.name.as_deref(), Some("temp-content-s1"));
    assert_eq!(
        pod.metadata.annotations.as_ref().unwrap()[CONTENT_TTL_ANNOTATION],
        "600"
    );

    let pod_labels = pod.metadata.labels.as_ref().unwrap();
    let selector = service.spec.as_ref().unwrap().selector.as_ref().unwrap();
    assert_eq!(pod_labels, selector);

    let container = &pod.spec.as_ref().unwrap().containers[0];
    let probe = container.readiness_probe.as_ref().unwrap().http_get.as_ref().unwrap();
    assert_eq!(probe.path.as_deref(), Some("/health"));

    let env = container.env.as_ref().unwrap();
    assert!(env.iter().any(|e| e.name == "CONTENT_SERVICE_MODE" && e.value.as_deref() == Some("true")));
}
