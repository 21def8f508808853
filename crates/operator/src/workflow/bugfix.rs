// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BugFix workflow orchestration.
//!
//! A workflow is anchored to a GitHub issue (creating one from the
//! description when needed), prepares a working branch on the
//! implementation repo, and applies the side effects of typed sessions
//! when they complete: findings and plans become issue comments, a
//! finished implementation can auto-open a PR, and the workflow can
//! mirror itself into Jira idempotently.

use super::{
    Ctx, OrchestratorError, AUTO_PUSH_ANNOTATION, EFFECTS_APPLIED_ANNOTATION,
    JIRA_SYNC_WINDOW_SECS, SESSION_TYPE_LABEL, SYNC_JIRA_ANNOTATION, WORKFLOW_LABEL,
};
use ambient_cluster::{AgenticSession, BugFixWorkflow};
use ambient_core::workflow::{BugFixPhase, BugFixSessionType};
use ambient_core::{Clock, SessionPhase};
use ambient_providers::{
    parse_issue_url, GitProvider, GithubClient, GitlabClient, JiraClient, NewIssue,
    NewPullRequest, Provider, RepoRef,
};
use kube::api::{ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Deterministic markdown body for issues created from a description.
pub fn issue_body(description: &str, created_by: &str) -> String {
    format!(
        "## Bug Description\n\n{description}\n\n\
         ## Reproduction Steps\n\n_To be filled in by the bug-review session._\n\n\
         ## Expected Behavior\n\n_To be determined._\n\n\
         ## Actual Behavior\n\n_To be determined._\n\n\
         ## Additional Context\n\n_None provided._\n\n\
         ---\n_Filed by the Ambient control plane on behalf of {created_by}._\n"
    )
}

/// Issue comment posted when a typed session completes. None for types
/// without external effects.
pub fn completion_comment(
    session_type: BugFixSessionType,
    session_name: &str,
    result: Option<&str>,
) -> Option<String> {
    let body = result.unwrap_or("The session completed without a result summary.");
    match session_type {
        BugFixSessionType::BugReview => Some(format!(
            "### Root-cause assessment\n\n{body}\n\n_Posted from session `{session_name}`._"
        )),
        BugFixSessionType::BugResolutionPlan => Some(format!(
            "### Proposed fix plan\n\n{body}\n\n_Posted from session `{session_name}`._"
        )),
        BugFixSessionType::BugImplementFix | BugFixSessionType::Generic => None,
    }
}

/// PR body for an auto-pushed implementation.
pub fn pull_request_body(issue_number: u64, session_name: &str) -> String {
    format!(
        "Implements the fix for #{issue_number}.\n\n\
         Closes #{issue_number}.\n\n\
         _Opened from session `{session_name}`._\n"
    )
}

/// Parse a session's declared type from its labels.
pub fn session_type(session: &AgenticSession) -> BugFixSessionType {
    session
        .labels()
        .get(SESSION_TYPE_LABEL)
        .and_then(|v| serde_json::from_value(serde_json::Value::String(v.clone())).ok())
        .unwrap_or(BugFixSessionType::Generic)
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
    workflow: Arc<BugFixWorkflow>,
    ctx: Arc<Ctx>,
) -> Result<Action, OrchestratorError> {
    let name = workflow.name_any();
    let Some(namespace) = workflow.meta().namespace.clone() else {
        return Ok(Action::await_change());
    };
    if workflow.meta().deletion_timestamp.is_some() {
        return Ok(Action::await_change());
    }

    let workflows: Api<BugFixWorkflow> = Api::namespaced(ctx.client.clone(), &namespace);
    let phase = workflow.status.as_ref().map(|s| s.phase).unwrap_or_default();

    if phase == BugFixPhase::Initializing {
        initialize(&workflow, &ctx, &namespace, &workflows).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    apply_session_effects(&workflow, &ctx, &namespace, &workflows).await?;

    if let Some(mode) = annotation(&workflow, SYNC_JIRA_ANNOTATION) {
        sync_jira(&workflow, &ctx, &namespace, &workflows, mode == "force").await?;
        clear_annotation(&workflows, &name, SYNC_JIRA_ANNOTATION).await?;
    }

    Ok(Action::requeue(Duration::from_secs(crate::env::resync_secs())))
}

fn annotation(workflow: &BugFixWorkflow, key: &str) -> Option<String> {
    workflow.meta().annotations.as_ref().and_then(|a| a.get(key)).cloned()
}

/// Anchor the workflow to an issue and prepare the working branch, then
/// move to Ready. Session creation is gated on Ready at the gateway.
async fn initialize(
    workflow: &BugFixWorkflow,
    ctx: &Ctx,
    namespace: &str,
    workflows: &Api<BugFixWorkflow>,
) -> Result<(), OrchestratorError> {
    let name = workflow.name_any();
    let repo = RepoRef::parse(&workflow.spec.implementation_repo.url)?;
    let token = super::project_git_token(&ctx.client, namespace).await?;
    let provider = provider_for(ctx, &repo, token);

    // Free-text workflows get an issue filed for them.
    let mut issue = workflow.spec.github_issue.clone();
    if issue.url.is_empty() {
        let created = provider
            .create_issue(
                &repo,
                &NewIssue {
                    title: workflow.spec.title.clone(),
                    body: issue_body(&workflow.spec.description, &workflow.spec.created_by),
                    labels: vec!["bug".to_string()],
                },
            )
            .await?;
        info!(workflow = %name, issue = created.number, "filed anchor issue");
        issue.number = created.number;
        issue.url = created.html_url;
        let patch = serde_json::json!({ "spec": { "githubIssue": issue } });
        workflows.patch(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    } else {
        // Validate the anchor early so a bad URL fails Initializing.
        parse_issue_url(&issue.url)?;
    }

    let base = workflow.spec.implementation_repo.branch.as_deref().unwrap_or("main");
    provider.create_branch(&repo, &workflow.spec.branch_name, base).await?;

    let patch = serde_json::json!({ "status": { "phase": BugFixPhase::Ready } });
    workflows.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    info!(workflow = %name, branch = %workflow.spec.branch_name, "workflow ready");
    Ok(())
}

/// Apply completion side effects for this workflow's typed sessions.
async fn apply_session_effects(
    workflow: &BugFixWorkflow,
    ctx: &Ctx,
    namespace: &str,
    workflows: &Api<BugFixWorkflow>,
) -> Result<(), OrchestratorError> {
    let name = workflow.name_any();
    let sessions: Api<AgenticSession> = Api::namespaced(ctx.client.clone(), namespace);
    let selector = format!("{WORKFLOW_LABEL}={name}");
    let list = sessions.list(&ListParams::default().labels(&selector)).await?;

    let (repo, number) = parse_issue_url(&workflow.spec.github_issue.url)?;
    let token = super::project_git_token(&ctx.client, namespace).await?;
    let provider = provider_for(ctx, &repo, token);

    for session in list {
        let session_name = session.name_any();
        let phase = session.status.as_ref().map(|s| s.phase).unwrap_or_default();
        if phase != SessionPhase::Completed {
            continue;
        }
        let applied = session
            .annotations()
            .get(EFFECTS_APPLIED_ANNOTATION)
            .map(|v| v == "true")
            .unwrap_or(false);
        if applied {
            continue;
        }

        let declared = session_type(&session);
        let result = session.status.as_ref().and_then(|s| s.result.clone());

        if let Some(comment) = completion_comment(declared, &session_name, result.as_deref()) {
            provider.add_issue_comment(&repo, number, &comment).await?;
            info!(workflow = %name, session = %session_name, issue = number, "posted completion comment");
        }

        match declared {
            BugFixSessionType::BugReview => {
                let patch =
                    serde_json::json!({ "status": { "assessmentStatus": "complete" } });
                workflows.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
            }
            BugFixSessionType::BugImplementFix => {
                let auto_push = session
                    .annotations()
                    .get(AUTO_PUSH_ANNOTATION)
                    .map(|v| v == "true")
                    .unwrap_or(false);
                if auto_push {
                    // The runner pushed the working branch before exiting;
                    // the orchestrator opens the PR against the base.
                    let base =
                        workflow.spec.implementation_repo.branch.as_deref().unwrap_or("main");
                    let pr = provider
                        .create_pull_request(
                            &repo,
                            &NewPullRequest {
                                title: format!("Fix: {}", workflow.spec.title),
                                body: pull_request_body(number, &session_name),
                                head: workflow.spec.branch_name.clone(),
                                base: base.to_string(),
                                draft: false,
                            },
                        )
                        .await?;
                    info!(workflow = %name, pr = pr.number, "opened pull request");
                }
                let patch =
                    serde_json::json!({ "status": { "implementationCompleted": true } });
                workflows.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
            }
            _ => {}
        }

        let patch = serde_json::json!({
            "metadata": { "annotations": { EFFECTS_APPLIED_ANNOTATION: "true" } }
        });
        sessions.patch(&session_name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    }
    Ok(())
}

/// Mirror the workflow into Jira. First call creates the task and stores
/// its key; later calls update it. Unforced calls within the recency
/// window are no-ops.
async fn sync_jira(
    workflow: &BugFixWorkflow,
    ctx: &Ctx,
    namespace: &str,
    workflows: &Api<BugFixWorkflow>,
    force: bool,
) -> Result<(), OrchestratorError> {
    let name = workflow.name_any();
    let status = workflow.status.clone().unwrap_or_default();
    let now = ctx.clock.now_utc();

    if !force && status.synced_within(now, JIRA_SYNC_WINDOW_SECS) {
        info!(workflow = %name, "jira sync skipped (within recency window)");
        return Ok(());
    }

    let Some(config) = super::project_jira_config(&ctx.client, namespace).await? else {
        return Err(OrchestratorError::Invalid(
            "Jira is not configured in the project's runner secret".to_string(),
        ));
    };
    let jira = JiraClient::new(ctx.http.clone(), config);
    let description = format!(
        "{}\n\nGitHub issue: {}\nWorking branch: {}",
        workflow.spec.description, workflow.spec.github_issue.url, workflow.spec.branch_name
    );

    let (key, url) = match status.jira_task_key {
        Some(ref key) => {
            jira.update_issue(key, Some(&workflow.spec.title), Some(&description)).await?;
            (key.clone(), jira.browse_url(key))
        }
        None => {
            let created = jira.create_issue(&workflow.spec.title, &description, "Task").await?;
            let url = jira.browse_url(&created.key);
            (created.key, url)
        }
    };

    let patch = serde_json::json!({
        "status": {
            "jiraTaskKey": key,
            "jiraTaskUrl": url,
            "lastSyncedAt": now,
        }
    });
    workflows.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    info!(workflow = %name, "jira synced");
    Ok(())
}

async fn clear_annotation(
    api: &Api<BugFixWorkflow>,
    name: &str,
    annotation: &str,
) -> Result<(), OrchestratorError> {
    let patch = serde_json::json!({ "metadata": { "annotations": { annotation: null } } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

#[cfg(test)]
#[path = "bugfix_tests.rs"]
mod tests;
