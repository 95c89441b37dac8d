//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! Primarily useful for development, debugging and the demos.
//!
//! ## Output format
//! ```text
//! [ready] task=present-dialog
//! [starting] task=provide-item
//! [progress] task=provide-item value=0.25
//! [cancel-requested] task=provide-item
//! [finished] task=provide-item reason=cancelled
//! [graph-cancelled]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// implement a custom [`Subscribe`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskReady => {
                println!("[ready] task={:?}", e.task);
            }
            EventKind::TaskStarting => {
                println!("[starting] task={:?}", e.task);
            }
            EventKind::TaskFinished => match &e.reason {
                Some(reason) => println!("[finished] task={:?} reason={reason}", e.task),
                None => println!("[finished] task={:?}", e.task),
            },
            EventKind::CancelRequested => {
                println!("[cancel-requested] task={:?}", e.task);
            }
            EventKind::ProgressReported => {
                if let Some(p) = e.progress {
                    println!("[progress] task={:?} value={p:.2}", e.task);
                }
            }
            EventKind::GraphCompleted => {
                println!("[graph-completed]");
            }
            EventKind::GraphCancelled => {
                println!("[graph-cancelled]");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={:?} reason={:?}", e.task, e.reason);
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={:?} reason={:?}", e.task, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
