//! # Collaborator interfaces for the host platform.
//!
//! The engine never talks to a concrete presentation or application-lifecycle
//! API. Instead the lifecycle tasks are written against the three small traits
//! in this module, and the host wires in whatever implements them:
//!
//! - [`DialogSurface`] — a modal progress surface that can be presented and
//!   dismissed. Held weakly by the tasks; a torn-down surface is a valid
//!   state and the side effect is skipped.
//! - [`BackgroundLifecycle`] — an opaque background-execution window
//!   bracketing long work (begin yields a [`WindowToken`], end releases it).
//! - [`ForegroundGate`] — a query for "is the host active?" plus a one-shot
//!   became-active signal. Dropping the signal future unregisters the
//!   subscription, so both the completion and the cancellation path clean up.

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Modal progress surface, presented before the producer runs and dismissed
/// after it is terminal.
///
/// The `async fn` resolving is the completion signal: `present` resolves once
/// the surface is on screen, `dismiss` once it is gone.
#[async_trait]
pub trait DialogSurface: Send + Sync + 'static {
    /// Shows the surface in its presentation context.
    async fn present(&self);

    /// Hides the surface.
    async fn dismiss(&self);
}

/// Opaque handle for one background-execution window.
///
/// Obtained from [`BackgroundLifecycle::begin_window`] and handed back to
/// [`BackgroundLifecycle::end_window`]. The engine never inspects it beyond
/// moving it from the begin task to its paired end task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowToken(u64);

impl WindowToken {
    /// Wraps a host-assigned identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the host-assigned identifier.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Background-execution window management.
///
/// The producer task is bracketed by a begin/end pair so the host can keep
/// the process alive while the item is being produced.
pub trait BackgroundLifecycle: Send + Sync + 'static {
    /// Opens a window. `None` means the host declined; the paired end task
    /// will then skip the release.
    fn begin_window(&self) -> Option<WindowToken>;

    /// Releases a previously opened window.
    fn end_window(&self, token: WindowToken);
}

/// Foreground-state query and one-shot activation signal.
pub trait ForegroundGate: Send + Sync + 'static {
    /// True if the host process is currently active/foreground.
    fn is_active(&self) -> bool;

    /// A future resolving the next time the host becomes active.
    ///
    /// The subscription is scoped to the returned future: dropping it
    /// unregisters, whether the waiter completed or was cancelled.
    fn on_activate(&self) -> BoxFuture<'static, ()>;
}
