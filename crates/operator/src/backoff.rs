// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff with jitter for transient cluster errors.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff: base doubles each attempt up to a cap, with up to
/// 50% additive jitter so retries from many resources do not align.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// The reconciler default: 2s base, 5m cap.
    pub fn cluster_default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(300))
    }

    /// Deterministic delay for an attempt, before jitter.
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.min(16));
        let raw = self.base.saturating_mul(factor as u32);
        raw.min(self.cap)
    }

    /// Jittered delay for an attempt (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = self.raw_delay(attempt);
        let jitter_ms = rand::thread_rng().gen_range(0..=raw.as_millis().max(1) / 2) as u64;
        raw + Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
