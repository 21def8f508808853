// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFE workflow orchestration: seeding and phase fan-out.

use super::{
    Ctx, OrchestratorError, ADVANCE_AGENTS_ANNOTATION, PUBLISH_JIRA_ANNOTATION,
    SEED_REQUESTED_ANNOTATION, WORKFLOW_LABEL,
};
use ambient_core::workflow::JiraLink;
use ambient_providers::JiraClient;
use ambient_cluster::{AgenticSession, RfeWorkflow};
use ambient_core::session::{ActiveWorkflow, RepoInput, SessionRepo, SessionSpec};
use ambient_core::Clock;
use ambient_providers::{GitProvider, GithubClient, GitlabClient, Provider, RepoRef};
use kube::api::{Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::{Api, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Paths that mark an umbrella repo as seeded.
pub const SEED_MARKER_PATH: &str = ".ambient";

/// Files written by the seeding commit when the marker tree is absent.
pub fn seed_files(workflow: &RfeWorkflow) -> Vec<(String, String)> {
    let title = &workflow.spec.title;
    vec![
        (
            format!("{SEED_MARKER_PATH}/template.md"),
            format!(
                "# {title}\n\n## Overview\n\n{}\n\n## Acceptance Criteria\n\n- [ ] \n",
                workflow.spec.description
            ),
        ),
        (
            format!("{SEED_MARKER_PATH}/agents/README.md"),
            "Agent definitions for this workflow. One file per agent; each file's \
             frontmatter names the agent and its phase prompt.\n"
                .to_string(),
        ),
    ]
}

fn provider_for(
    ctx: &Ctx,
    repo: &RepoRef,
    token: Option<String>,
) -> Box<dyn GitProvider + Send + Sync> {
    match repo.provider {
        Provider::Github => Box::new(GithubClient::new(ctx.http.clone(), token)),
        Provider::Gitlab => Box::new(GitlabClient::new(ctx.http.clone(), token)),
    }
}

pub async fn reconcile(
    workflow: Arc<RfeWorkflow>,
    ctx: Arc<Ctx>,
) -> Result<Action, OrchestratorError> {
    let name = workflow.name_any();
    let Some(namespace) = workflow.meta().namespace.clone() else {
        return Ok(Action::await_change());
    };
    if workflow.meta().deletion_timestamp.is_some() {
        // Sessions are referenced, not owned: deleting a workflow leaves
        // its sessions in place.
        return Ok(Action::await_change());
    }

    let workflows: Api<RfeWorkflow> = Api::namespaced(ctx.client.clone(), &namespace);

    if annotation(&workflow, SEED_REQUESTED_ANNOTATION).is_some() {
        seed(&workflow, &ctx, &namespace).await?;
        clear_annotation(&workflows, &name, SEED_REQUESTED_ANNOTATION).await?;
        mark_seeded(&workflows, &name, &ctx).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    if let Some(agents) = annotation(&workflow, ADVANCE_AGENTS_ANNOTATION) {
        let agents: Vec<String> =
            agents.split(',').map(str::trim).filter(|a| !a.is_empty()).map(String::from).collect();
        let created = advance_phase(&workflow, &ctx, &namespace, &agents).await?;
        clear_annotation(&workflows, &name, ADVANCE_AGENTS_ANNOTATION).await?;
        record_sessions(&workflows, &name, &workflow, &created, &ctx).await?;
        info!(workflow = %name, sessions = created.len(), "phase advanced");
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    if let Some(path) = annotation(&workflow, PUBLISH_JIRA_ANNOTATION) {
        publish_jira(&workflow, &ctx, &namespace, &path).await?;
        clear_annotation(&workflows, &name, PUBLISH_JIRA_ANNOTATION).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    Ok(Action::await_change())
}

/// Publish one workspace file to Jira: create (or update) an issue from
/// the file's content and record {path, jiraKey} on the workflow.
async fn publish_jira(
    workflow: &RfeWorkflow,
    ctx: &Ctx,
    namespace: &str,
    path: &str,
) -> Result<(), OrchestratorError> {
    let name = workflow.name_any();
    let repo = RepoRef::parse(&workflow.spec.umbrella_repo.url)?;
    let token = super::project_git_token(&ctx.client, namespace).await?;
    let provider = provider_for(ctx, &repo, token);
    let content = provider.get_blob(&repo, &workflow.spec.branch_name, path).await?.content;

    let Some(config) = super::project_jira_config(&ctx.client, namespace).await? else {
        return Err(OrchestratorError::Invalid(
            "Jira is not configured in the project's runner secret".to_string(),
        ));
    };
    let jira = JiraClient::new(ctx.http.clone(), config);

    let mut links =
        workflow.status.as_ref().map(|s| s.jira_links.clone()).unwrap_or_default();
    let summary = format!("{}: {path}", workflow.spec.title);
    match links.iter().find(|l| l.path == path) {
        Some(existing) => {
            jira.update_issue(&existing.jira_key, Some(&summary), Some(&content)).await?;
        }
        None => {
            let created = jira.create_issue(&summary, &content, "Story").await?;
            links.push(JiraLink { path: path.to_string(), jira_key: created.key });
        }
    }

    let workflows: Api<RfeWorkflow> = Api::namespaced(ctx.client.clone(), namespace);
    let patch = serde_json::json!({
        "status": { "jiraLinks": links, "updatedAt": ctx.clock.now_utc() }
    });
    workflows.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    info!(workflow = %name, %path, "published to jira");
    Ok(())
}

fn annotation(workflow: &RfeWorkflow, key: &str) -> Option<String> {
    workflow.meta().annotations.as_ref().and_then(|a| a.get(key)).cloned()
}

/// Verify the umbrella repo carries the seed tree; populate it with a
/// scripted commit on the workflow branch when absent.
async fn seed(
    workflow: &RfeWorkflow,
    ctx: &Ctx,
    namespace: &str,
) -> Result<(), OrchestratorError> {
    let repo = RepoRef::parse(&workflow.spec.umbrella_repo.url)?;
    let token = super::project_git_token(&ctx.client, namespace).await?;
    let provider = provider_for(ctx, &repo, token);
    let branch = &workflow.spec.branch_name;
    let base = workflow.spec.umbrella_repo.branch.as_deref().unwrap_or("main");

    provider.create_branch(&repo, branch, base).await?;

    let seeded = provider.get_tree(&repo, branch, SEED_MARKER_PATH).await.map(|t| !t.is_empty());
    if matches!(seeded, Ok(true)) {
        info!(workflow = %workflow.name_any(), "umbrella repo already seeded");
        return Ok(());
    }

    for (path, content) in seed_files(workflow) {
        provider
            .put_file(
                &repo,
                branch,
                &path,
                &content,
                &format!("Seed workflow workspace for {}", workflow.spec.title),
            )
            .await?;
    }
    info!(workflow = %workflow.name_any(), %branch, "seeded umbrella repo");
    Ok(())
}

/// Build the session spec for one agent of a phase advance. All sessions
/// share the workflow's branch and workspace path.
pub fn phase_session_spec(workflow: &RfeWorkflow, agent: &str) -> SessionSpec {
    let mut repos = vec![SessionRepo {
        input: RepoInput {
            url: workflow.spec.umbrella_repo.url.clone(),
            branch: workflow.spec.umbrella_repo.branch.clone(),
            working_branch: Some(workflow.spec.branch_name.clone()),
            // The workflow branch is purpose-made; never shield it.
            allow_protected_work: true,
            sync: None,
        },
        output: None,
        status: None,
    }];
    for supporting in &workflow.spec.supporting_repos {
        repos.push(SessionRepo {
            input: RepoInput {
                url: supporting.url.clone(),
                branch: supporting.branch.clone(),
                ..Default::default()
            },
            output: None,
            status: None,
        });
    }
    SessionSpec {
        prompt: format!(
            "Act as the {agent} agent for the enhancement {:?}. Work under {} on branch {}.",
            workflow.spec.title, workflow.spec.workspace_path, workflow.spec.branch_name
        ),
        display_name: Some(format!("{} — {agent}", workflow.spec.title)),
        repos,
        active_workflow: Some(ActiveWorkflow {
            git_url: workflow.spec.umbrella_repo.url.clone(),
            branch: workflow.spec.branch_name.clone(),
            path: workflow.spec.workspace_path.clone(),
        }),
        ..Default::default()
    }
}

/// One session per agent, labelled back to the workflow.
async fn advance_phase(
    workflow: &RfeWorkflow,
    ctx: &Ctx,
    namespace: &str,
    agents: &[String],
) -> Result<Vec<String>, OrchestratorError> {
    if agents.is_empty() {
        return Err(OrchestratorError::Invalid("phase advance with no agents".to_string()));
    }
    let sessions: Api<AgenticSession> = Api::namespaced(ctx.client.clone(), namespace);
    let mut created = Vec::new();
    for agent in agents {
        let slug = ambient_core::naming::slugify(agent, 2, 8);
        let session_name = ambient_core::session_name(
            &format!("{} {agent}", workflow.spec.title),
            ambient_core::WorkflowId::new().suffix(),
        );
        let mut session = AgenticSession::new(&session_name, phase_session_spec(workflow, agent).into());
        session.metadata.namespace = Some(namespace.to_string());
        let labels = session.metadata.labels.get_or_insert_with(Default::default);
        labels.insert(WORKFLOW_LABEL.to_string(), workflow.name_any());
        labels.insert("ambient-code.io/agent".to_string(), slug);

        match sessions.create(&PostParams::default(), &session).await {
            Ok(_) => created.push(session_name),
            Err(kube::Error::Api(ae)) if ae.code == 409 => created.push(session_name),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(created)
}

async fn mark_seeded(
    api: &Api<RfeWorkflow>,
    name: &str,
    ctx: &Ctx,
) -> Result<(), OrchestratorError> {
    let patch = serde_json::json!({
        "status": { "seeded": true, "updatedAt": ctx.clock.now_utc() }
    });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

async fn record_sessions(
    api: &Api<RfeWorkflow>,
    name: &str,
    workflow: &RfeWorkflow,
    created: &[String],
    ctx: &Ctx,
) -> Result<(), OrchestratorError> {
    let mut names =
        workflow.status.as_ref().map(|s| s.session_names.clone()).unwrap_or_default();
    for session in created {
        if !names.contains(session) {
            names.push(session.clone());
        }
    }
    let patch = serde_json::json!({
        "status": { "sessionNames": names, "updatedAt": ctx.clock.now_utc() }
    });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

async fn clear_annotation(
    api: &Api<RfeWorkflow>,
    name: &str,
    annotation: &str,
) -> Result<(), OrchestratorError> {
    let patch = serde_json::json!({ "metadata": { "annotations": { annotation: null } } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

#[cfg(test)]
#[path = "rfe_tests.rs"]
mod tests;
