// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ambient-gateway entry point.
//!
//! Runs either the full request plane or, when `CONTENT_SERVICE_MODE` is
//! set, only the workspace content service bound to `STATE_BASE_DIR`.

use ambient_gateway::{content, env, routes, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AMBIENT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let addr = env::bind_addr();

    let app = if env::content_service_mode() {
        let root = env::state_base_dir();
        info!(%addr, root = %root.display(), "starting workspace content service");
        content::router(root)
    } else {
        let factory = match ambient_cluster::ClientFactory::infer().await {
            Ok(factory) => factory,
            Err(e) => {
                error!(error = %e, "failed to load cluster config");
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
        info!(%addr, "starting gateway");
        routes::router(AppState::new(factory, http))
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited");
        std::process::exit(1);
    }
}
