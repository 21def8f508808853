// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn managed_label_detection() {
    let mut labels = BTreeMap::new();
    assert!(!is_managed(&labels));

    labels.insert(MANAGED_LABEL.to_string(), "false".to_string());
    assert!(!is_managed(&labels));

    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    assert!(is_managed(&labels));
}

#[test]
fn namespace_metadata_round_trip() {
    let meta = ProjectMeta {
        name: "acme".into(),
        display_name: Some("Acme Corp".into()),
        description: Some("Internal tooling".into()),
        creation_timestamp: None,
        status: None,
    };
    let (labels, annotations) = meta.to_namespace_metadata();
    assert!(is_managed(&labels));

    let back = ProjectMeta::from_annotations("acme", &annotations);
    assert_eq!(back.display_name.as_deref(), Some("Acme Corp"));
    assert_eq!(back.description.as_deref(), Some("Internal tooling"));
}

#[test]
fn missing_annotations_yield_none() {
    let back = ProjectMeta::from_annotations("acme", &BTreeMap::new());
    assert!(back.display_name.is_none());
    assert!(back.description.is_none());
}
