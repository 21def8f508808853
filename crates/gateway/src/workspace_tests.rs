// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn round_trip_and_listing() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "artifacts/plan.md", b"steps").unwrap();

    assert_eq!(read_file(dir.path(), "artifacts/plan.md").unwrap(), b"steps");

    let items = list_dir(dir.path(), "artifacts").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].path, "artifacts/plan.md");
    assert!(!items[0].is_dir);
}

#[test]
fn missing_paths() {
    let dir = tempdir().unwrap();
    assert!(list_dir(dir.path(), "nope").unwrap().is_empty());
    let err = read_file(dir.path(), "nope.txt").unwrap_err();
    assert_eq!(err.0.code, ambient_core::ErrorKind::NotFound);
}

#[test]
fn traversal_is_rejected() {
    let dir = tempdir().unwrap();
    let err = read_file(dir.path(), "../outside").unwrap_err();
    assert_eq!(err.0.code, ambient_core::ErrorKind::Validation);
    let err = write_file(dir.path(), "../outside", b"x").unwrap_err();
    assert_eq!(err.0.code, ambient_core::ErrorKind::Validation);
}
