// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ambient-operator entry point.
//!
//! Spawns the session reconciler and the two workflow controllers, then
//! waits for a termination signal and shuts them down cooperatively.

use ambient_operator::{session, workflow};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AMBIENT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn"));
    match std::env::var("AMBIENT_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ambient-operator.log");
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(appender).init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let client = match kube::Client::try_default().await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build cluster client");
            std::process::exit(1);
        }
    };
    let http = match ambient_providers::http_client() {
        Ok(http) => http,
        Err(e) => {
            error!(error = %e, "failed to build provider http client");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let controllers = vec![
        tokio::spawn(session::run(client.clone(), cancel.child_token())),
        tokio::spawn(workflow::run_rfe(client.clone(), http.clone(), cancel.child_token())),
        tokio::spawn(workflow::run_bugfix(client, http, cancel.child_token())),
    ];
    info!("ambient-operator started");

    shutdown_signal().await;
    info!("shutting down");
    cancel.cancel();
    for controller in controllers {
        let _ = controller.await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(_) => {
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
