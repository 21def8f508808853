// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the gateway.

use std::path::PathBuf;

/// Whether this process runs as the workspace content service only.
pub fn content_service_mode() -> bool {
    std::env::var("CONTENT_SERVICE_MODE")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Base directory for workspace state (default `/workspace`).
pub fn state_base_dir() -> PathBuf {
    PathBuf::from(std::env::var("STATE_BASE_DIR").unwrap_or_else(|_| "/workspace".to_string()))
}

/// Listen address.
pub fn bind_addr() -> String {
    std::env::var("AMBIENT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}
