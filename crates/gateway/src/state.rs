// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared gateway state.
//!
//! Process-wide singletons (token manager, event log, stream bus) are
//! constructed once at startup with explicit init; none of them carries
//! request identity — identity lives in per-request extensions only.

use crate::env;
use ambient_cluster::ClientFactory;
use ambient_core::SystemClock;
use ambient_events::{EventLog, StreamBus};
use ambient_providers::{GithubAppConfig, TokenManager};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub factory: ClientFactory,
    pub http: reqwest::Client,
    pub tokens: Option<Arc<TokenManager>>,
    pub bus: StreamBus,
    pub clock: SystemClock,
    pub state_base: PathBuf,
}

impl AppState {
    pub fn new(factory: ClientFactory, http: reqwest::Client) -> Self {
        let state_base = env::state_base_dir();
        let tokens = GithubAppConfig::from_env()
            .map(|config| Arc::new(TokenManager::new(config, http.clone())));
        Self { factory, http, tokens, bus: StreamBus::new(), clock: SystemClock, state_base }
    }

    /// Root of one session's workspace on the shared state volume. The
    /// per-session volume mounts this same subtree at `/workspace` inside
    /// the pod, so paths line up on both sides.
    pub fn workspace_root(&self, project: &str, session: &str) -> PathBuf {
        self.state_base.join(project).join(session)
    }

    /// The session's event-log store (threads under its workspace).
    pub fn session_log(&self, project: &str, session: &str) -> EventLog {
        EventLog::new(self.workspace_root(project, session))
    }
}
