// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL event logs on the workspace volume.
//!
//! One file per run at `<base>/events/<threadId>/<runId>.jsonl`. The
//! appender assigns monotonic `seq` numbers and wakes readers through a
//! per-run [`tokio::sync::Notify`]; readers see a prefix-consistent view
//! because lines are written with a single `write_all` under the run lock.

use crate::protocol::{AgEvent, RunId, ThreadId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

/// Event-log failure.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed event at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("event thread/run does not match log location")]
    WrongLog,
}

#[derive(Default)]
struct RunState {
    next_seq: u64,
    notify: Arc<Notify>,
}

/// Store of per-run event logs under a base directory.
#[derive(Clone)]
pub struct EventLog {
    base: PathBuf,
    runs: Arc<Mutex<HashMap<(ThreadId, RunId), RunState>>>,
}

impl EventLog {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), runs: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Path of a run's log file.
    pub fn run_path(&self, thread: &ThreadId, run: &RunId) -> PathBuf {
        self.base.join("events").join(thread.as_str()).join(format!("{}.jsonl", run.as_str()))
    }

    /// Append an event, assigning its `seq`. Returns the assigned value.
    pub fn append(&self, mut event: AgEvent) -> Result<u64, EventLogError> {
        let key = (event.thread_id.clone(), event.run_id.clone());
        let path = self.run_path(&key.0, &key.1);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EventLogError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut runs = self.runs.lock();
        let state = match runs.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(v) => {
                let next_seq = count_lines(&path)?;
                v.insert(RunState { next_seq, notify: Arc::new(Notify::new()) })
            }
        };

        let seq = state.next_seq;
        event.seq = Some(seq);
        let mut line = serde_json::to_string(&event).map_err(|source| EventLogError::Malformed {
            path: path.clone(),
            line: seq as usize,
            source,
        })?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path).map_err(
            |source| EventLogError::Io { path: path.clone(), source },
        )?;
        file.write_all(line.as_bytes())
            .map_err(|source| EventLogError::Io { path: path.clone(), source })?;

        state.next_seq = seq + 1;
        state.notify.notify_waiters();
        Ok(seq)
    }

    /// Read every event of a run, in append order.
    pub fn read_all(&self, thread: &ThreadId, run: &RunId) -> Result<Vec<AgEvent>, EventLogError> {
        self.read_after(thread, run, None)
    }

    /// Read events with `seq` strictly greater than `after` (all when None).
    pub fn read_after(
        &self,
        thread: &ThreadId,
        run: &RunId,
        after: Option<u64>,
    ) -> Result<Vec<AgEvent>, EventLogError> {
        let path = self.run_path(thread, run);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(EventLogError::Io { path, source }),
        };
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| EventLogError::Io { path: path.clone(), source })?;
            if line.trim().is_empty() {
                continue;
            }
            let event: AgEvent = serde_json::from_str(&line).map_err(|source| {
                EventLogError::Malformed { path: path.clone(), line: idx + 1, source }
            })?;
            if let Some(after) = after {
                if event.seq.unwrap_or(idx as u64) <= after {
                    continue;
                }
            }
            events.push(event);
        }
        Ok(events)
    }

    /// Run ids recorded for a thread, lexicographic.
    pub fn runs_for_thread(&self, thread: &ThreadId) -> Result<Vec<RunId>, EventLogError> {
        let dir = self.base.join("events").join(thread.as_str());
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(EventLogError::Io { path: dir, source }),
        };
        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| EventLogError::Io { path: dir.clone(), source })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(run) = name.strip_suffix(".jsonl") {
                runs.push(RunId::new(run));
            }
        }
        runs.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(runs)
    }

    /// Notifier that fires on every append to the given run.
    pub fn watch(&self, thread: &ThreadId, run: &RunId) -> Arc<Notify> {
        let mut runs = self.runs.lock();
        let key = (thread.clone(), run.clone());
        match runs.get(&key) {
            Some(state) => state.notify.clone(),
            None => {
                let state = runs.entry(key).or_default();
                state.notify.clone()
            }
        }
    }
}

fn count_lines(path: &Path) -> Result<u64, EventLogError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(source) => return Err(EventLogError::Io { path: path.to_path_buf(), source }),
    };
    let reader = BufReader::new(file);
    let mut count = 0u64;
    for line in reader.lines() {
        let line = line.map_err(|source| EventLogError::Io { path: path.to_path_buf(), source })?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
