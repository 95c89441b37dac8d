//! # Runtime events emitted by the graph, the producer and the façade.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: scheduling flow (ready, starting, finished,
//!   cancel-requested)
//! - **Progress events**: fractional progress reports from the producer
//! - **Run events**: whole-graph outcome (completed, cancelled) and
//!   subscriber faults (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name and id, reasons and progress values.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use itemflow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProgressReported)
//!     .with_task("provide-item")
//!     .with_progress(0.5);
//!
//! assert_eq!(ev.kind, EventKind::ProgressReported);
//! assert_eq!(ev.task.as_deref(), Some("provide-item"));
//! assert_eq!(ev.progress, Some(0.5));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task scheduling events ===
    /// All of a task's dependencies are terminal; it may start.
    ///
    /// Sets: `task`, `task_id`, `at`, `seq`.
    TaskReady,

    /// Task is starting on a worker.
    ///
    /// Sets: `task`, `task_id`, `at`, `seq`.
    TaskStarting,

    /// Task reached its terminal state (finished normally **or** after a
    /// cancellation request — `reason` distinguishes the two).
    ///
    /// Sets: `task`, `task_id`, `reason` (`"cancelled"` when applicable),
    /// `at`, `seq`.
    TaskFinished,

    /// Cancellation was requested for a task (first request only; repeats
    /// are idempotent and silent).
    ///
    /// Sets: `task`, `task_id`, `at`, `seq`.
    CancelRequested,

    // === Progress events ===
    /// The producer reported fractional progress.
    ///
    /// Sets: `task`, `task_id`, `progress` (clamped to `[0, 1]`), `at`, `seq`.
    ProgressReported,

    // === Run events ===
    /// Every task in the graph is terminal and no user cancellation was
    /// observed.
    ///
    /// Sets: `at`, `seq`.
    GraphCompleted,

    /// Every task in the graph is terminal and the run ended in
    /// user-requested cancellation.
    ///
    /// Sets: `at`, `seq`.
    GraphCancelled,

    // === Subscriber faults ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`, `at`, `seq`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic info), `at`, `seq`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Scheduler-assigned task id, if applicable.
    pub task_id: Option<u64>,
    /// Fractional progress in `[0, 1]`.
    pub progress: Option<f64>,
    /// Human-readable reason (cancellation, overflow details, panic info).
    pub reason: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            task: None,
            task_id: None,
            progress: None,
            reason: None,
            kind,
        }
    }

    /// Attaches a task (or subscriber) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a scheduler-assigned task id.
    #[inline]
    pub fn with_task_id(mut self, id: u64) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches a progress value.
    #[inline]
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for terminal task events.
    #[inline]
    pub fn is_task_finished(&self) -> bool {
        matches!(self.kind, EventKind::TaskFinished)
    }
}
