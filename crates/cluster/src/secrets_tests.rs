// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn well_known_keys_cover_the_runner_contract() {
    assert_eq!(WELL_KNOWN_RUNNER_KEYS.len(), 8);
    assert!(WELL_KNOWN_RUNNER_KEYS.contains(&"ANTHROPIC_API_KEY"));
    assert!(WELL_KNOWN_RUNNER_KEYS.contains(&"JIRA_API_TOKEN"));
}

#[test]
fn config_serde_is_camel_case() {
    let config = RunnerSecretConfig { selected_secret_name: Some("ambient-runner".into()) };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["selectedSecretName"], "ambient-runner");

    let empty: RunnerSecretConfig = serde_json::from_str("{}").unwrap();
    assert!(empty.selected_secret_name.is_none());
}
