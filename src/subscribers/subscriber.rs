//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging custom event
//! handlers into a façade run (an external progress display, logging,
//! metrics).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via
//!   [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only**; other
//!   subscribers are unaffected.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block publishers or each other.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for run observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use itemflow::{Event, EventKind, Subscribe};
///
/// struct ProgressDisplay;
///
/// #[async_trait]
/// impl Subscribe for ProgressDisplay {
///     async fn on_event(&self, ev: &Event) {
///         if let (EventKind::ProgressReported, Some(p)) = (ev.kind, ev.progress) {
///             // update an external display with `p`
///             let _ = p;
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "progress-display"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    /// Events are delivered in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs and fault events.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose — override it when
    /// possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// On overflow the new event is dropped for this subscriber only. The
    /// runtime clamps capacity to a minimum of 1. Default: 256.
    fn queue_capacity(&self) -> usize {
        256
    }
}
