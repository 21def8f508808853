// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session workspace file access from the request plane.
//!
//! The gateway shares the state volume with session workloads (each
//! session's volume mounts a subtree of it), so workspace reads and
//! writes are local file operations behind the same traversal guard the
//! content service uses.

use crate::content::{resolve, ContentEntry};
use crate::error::GatewayError;
use std::path::Path;

/// Non-recursive listing of a workspace directory.
pub fn list_dir(root: &Path, requested: &str) -> Result<Vec<ContentEntry>, GatewayError> {
    let dir = resolve(root, requested)
        .ok_or_else(|| GatewayError::validation("path escapes the workspace"))?;
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(GatewayError::internal(format!("list {requested:?}: {e}"))),
    };
    let mut items = Vec::new();
    for entry in entries.flatten() {
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = if requested.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", requested.trim_end_matches('/'), name)
        };
        items.push(ContentEntry {
            name,
            path,
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified_at: metadata.modified().ok().map(chrono::DateTime::from),
        });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Raw file bytes.
pub fn read_file(root: &Path, requested: &str) -> Result<Vec<u8>, GatewayError> {
    let path = resolve(root, requested)
        .ok_or_else(|| GatewayError::validation("path escapes the workspace"))?;
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GatewayError::not_found(format!("no workspace file at {requested:?}")))
        }
        Err(e) => Err(GatewayError::internal(format!("read {requested:?}: {e}"))),
    }
}

/// Write a file, creating parents.
pub fn write_file(root: &Path, requested: &str, body: &[u8]) -> Result<(), GatewayError> {
    if requested.is_empty() {
        return Err(GatewayError::validation("missing file path"));
    }
    let path = resolve(root, requested)
        .ok_or_else(|| GatewayError::validation("path escapes the workspace"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| GatewayError::internal(format!("mkdir for {requested:?}: {e}")))?;
    }
    std::fs::write(&path, body)
        .map_err(|e| GatewayError::internal(format!("write {requested:?}: {e}")))
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
