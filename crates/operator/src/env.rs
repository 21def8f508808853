// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the operator.
//!
//! Workload-image settings live with the builders in
//! `ambient_cluster::workloads`; only operator-loop tuning lives here.

/// Periodic resync interval for the controllers (seconds).
pub fn resync_secs() -> u64 {
    std::env::var("AMBIENT_RESYNC_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(300)
}
