// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn raw_delay_doubles_until_cap() {
    let backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(60));
    assert_eq!(backoff.raw_delay(0), Duration::from_secs(2));
    assert_eq!(backoff.raw_delay(1), Duration::from_secs(4));
    assert_eq!(backoff.raw_delay(3), Duration::from_secs(16));
    assert_eq!(backoff.raw_delay(10), Duration::from_secs(60));
}

#[test]
fn huge_attempt_counts_do_not_overflow() {
    let backoff = Backoff::cluster_default();
    assert_eq!(backoff.raw_delay(u32::MAX), Duration::from_secs(300));
}

#[test]
fn jitter_stays_within_half_of_raw() {
    let backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(60));
    for attempt in 0..5 {
        let raw = backoff.raw_delay(attempt);
        for _ in 0..20 {
            let jittered = backoff.delay(attempt);
            assert!(jittered >= raw);
            assert!(jittered <= raw + raw / 2 + Duration::from_millis(1));
        }
    }
}
