// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded fan-out of live events to stream subscribers.
//!
//! One broadcast channel per run, single writer (the appender), multiple
//! readers. Buffers are bounded; a subscriber that falls more than
//! [`STREAM_BUFFER`] events behind is disconnected with a terminal error
//! instead of blocking the writer.

use crate::protocol::{AgEvent, RunId, ThreadId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Per-subscriber buffer capacity.
pub const STREAM_BUFFER: usize = 256;

/// Subscriber-side stream failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The subscriber was too slow and missed `skipped` events; the
    /// connection must be torn down (the client re-syncs via resume).
    #[error("subscriber lagged, {skipped} events dropped")]
    Lagged { skipped: u64 },
    /// The run's channel closed (session deleted or stream shut down).
    #[error("stream closed")]
    Closed,
}

/// A live subscription to one run's events.
pub struct Subscription {
    rx: broadcast::Receiver<AgEvent>,
}

impl Subscription {
    /// Receive the next event. [`StreamError::Lagged`] is terminal by
    /// contract: callers disconnect rather than continue with a gap.
    pub async fn recv(&mut self) -> Result<AgEvent, StreamError> {
        match self.rx.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                Err(StreamError::Lagged { skipped })
            }
            Err(broadcast::error::RecvError::Closed) => Err(StreamError::Closed),
        }
    }
}

/// Fan-out hub keyed by (thread, run).
#[derive(Clone, Default)]
pub struct StreamBus {
    channels: Arc<Mutex<HashMap<(ThreadId, RunId), broadcast::Sender<AgEvent>>>>,
}

impl StreamBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, thread: &ThreadId, run: &RunId) -> broadcast::Sender<AgEvent> {
        let mut channels = self.channels.lock();
        channels
            .entry((thread.clone(), run.clone()))
            .or_insert_with(|| broadcast::channel(STREAM_BUFFER).0)
            .clone()
    }

    /// Publish a live event. Events land here in append order because the
    /// single appender publishes under the log's run lock.
    pub fn publish(&self, event: &AgEvent) {
        let sender = self.sender(&event.thread_id, &event.run_id);
        // No receivers is fine; the log is the durable copy.
        let _ = sender.send(event.clone());
    }

    /// Subscribe to a run's live tail.
    pub fn subscribe(&self, thread: &ThreadId, run: &RunId) -> Subscription {
        Subscription { rx: self.sender(thread, run).subscribe() }
    }

    /// Close a run's channel, disconnecting all subscribers. Used when the
    /// session is stopped or deleted.
    pub fn close(&self, thread: &ThreadId, run: &RunId) {
        self.channels.lock().remove(&(thread.clone(), run.clone()));
    }

    /// Number of live subscribers on a run (for tests and metrics).
    pub fn subscriber_count(&self, thread: &ThreadId, run: &RunId) -> usize {
        self.channels
            .lock()
            .get(&(thread.clone(), run.clone()))
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
