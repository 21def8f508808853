// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proptest strategies and fixtures shared across crates' tests.

pub mod strategies {
    use crate::session::SessionPhase;
    use proptest::prelude::*;

    /// Any session phase, uniformly.
    pub fn arb_phase() -> impl Strategy<Value = SessionPhase> {
        prop_oneof![
            Just(SessionPhase::Pending),
            Just(SessionPhase::Creating),
            Just(SessionPhase::Running),
            Just(SessionPhase::Completed),
            Just(SessionPhase::Failed),
            Just(SessionPhase::Stopped),
            Just(SessionPhase::Error),
        ]
    }

    /// Display-name-ish strings, including degenerate ones, for the
    /// branch/session naming rules.
    pub fn arb_display_name() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[ -~]{0,40}").unwrap_or_else(|_| {
            // Regex above is a literal; this arm is unreachable.
            unreachable!("invalid display-name regex")
        })
    }
}
