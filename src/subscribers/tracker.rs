//! # Task state tracker with sequence-based ordering.
//!
//! Maintains the latest known scheduling state of every task seen on the
//! bus, using event sequence numbers to handle out-of-order delivery.
//!
//! ## Rules
//! - Only `TaskReady` / `TaskStarting` / `TaskFinished` change a task's
//!   tracked state; other events update the sequence only.
//! - Events with `seq <= last_seq` for a task are rejected (stale).
//! - Read operations (`snapshot`, `is_finished`) are eventually consistent
//!   with respect to in-flight queue deliveries.
//!
//! Tests use the tracker to assert that a completed run left no task in a
//! non-terminal state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Last known scheduling state of one task, as observed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedState {
    Ready,
    Running,
    Finished,
}

#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    state: TrackedState,
}

/// Thread-safe tracker of per-task scheduling states.
pub struct StateTracker {
    state: RwLock<HashMap<String, Entry>>,
}

impl StateTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Applies an event if it is newer than the last seen for its task.
    ///
    /// Returns whether the tracked state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let name = match ev.task.as_deref() {
            Some(n) => n,
            None => return false,
        };

        let next = match ev.kind {
            EventKind::TaskReady => Some(TrackedState::Ready),
            EventKind::TaskStarting => Some(TrackedState::Running),
            EventKind::TaskFinished => Some(TrackedState::Finished),
            _ => None,
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(Entry {
            last_seq: 0,
            state: TrackedState::Ready,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        match next {
            Some(s) => {
                entry.state = s;
                true
            }
            None => false,
        }
    }

    /// Returns the sorted names of tasks whose last known state is not
    /// terminal.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut open: Vec<String> = state
            .iter()
            .filter(|(_, e)| e.state != TrackedState::Finished)
            .map(|(name, _)| name.clone())
            .collect();
        open.sort_unstable();
        open
    }

    /// True if the task's last known state is terminal.
    pub async fn is_finished(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .map(|e| e.state == TrackedState::Finished)
            .unwrap_or(false)
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for StateTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "state-tracker"
    }
}
