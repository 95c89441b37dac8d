//! # Lifecycle tasks bracketing the producer.
//!
//! Each task here is a minimal [`Task`] whose `main` is a single side effect
//! plus an immediate `finish()`:
//!
//! - [`PresentDialogTask`] — shows the modal progress surface; wired as a
//!   dependency of the producer so the surface is up before work starts.
//! - [`DismissDialogTask`] — hides the surface; depends on the producer, so
//!   it runs after the producer is terminal whether it finished normally or
//!   was cancelled.
//! - [`BeginWindowTask`] / [`EndWindowTask`] — bracket the producer with a
//!   background-execution [`WindowToken`]; the token flows from begin to end
//!   through a slot owned by the pair, never through global state.
//! - [`AwaitForegroundTask`] — waits (cooperatively) for the host to become
//!   active before the run is considered over; depends on the end-window
//!   task.
//!
//! ## Stale references
//! The dialog tasks hold the surface weakly and resolve it at use time; a
//! torn-down surface is a valid state and the side effect is skipped — the
//! task still finishes immediately.
//!
//! ## Cancellation
//! Dismiss and end-window are cleanup edges: a cancellation request does not
//! skip them. Their `cancel` only sets the flag; the side effect still runs
//! once their dependencies are terminal, and `main` settles the handle. The
//! present and await-foreground tasks observe the flag and skip their work.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;

use crate::platform::{BackgroundLifecycle, DialogSurface, ForegroundGate, WindowToken};
use crate::tasks::state::TaskHandle;
use crate::tasks::task::Task;

/// Shows the modal progress surface before the producer starts.
pub struct PresentDialogTask {
    handle: TaskHandle,
    surface: Weak<dyn DialogSurface>,
}

impl PresentDialogTask {
    pub fn new(surface: Weak<dyn DialogSurface>) -> Self {
        Self {
            handle: TaskHandle::new("present-dialog"),
            surface,
        }
    }
}

#[async_trait]
impl Task for PresentDialogTask {
    fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    async fn main(&self) {
        // A cancelled run never shows the dialog.
        if !self.handle.is_cancelled() {
            if let Some(surface) = self.surface.upgrade() {
                surface.present().await;
            }
        }
        self.handle.finish();
    }

    fn cancel(&self) {
        let _ = self.handle.request_cancel();
    }
}

/// Hides the modal progress surface after the producer is terminal.
pub struct DismissDialogTask {
    handle: TaskHandle,
    surface: Weak<dyn DialogSurface>,
}

impl DismissDialogTask {
    pub fn new(surface: Weak<dyn DialogSurface>) -> Self {
        Self {
            handle: TaskHandle::new("dismiss-dialog"),
            surface,
        }
    }
}

#[async_trait]
impl Task for DismissDialogTask {
    fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    async fn main(&self) {
        // Dismissal is cleanup: runs even when the graph was cancelled.
        if let Some(surface) = self.surface.upgrade() {
            surface.dismiss().await;
        }
        self.handle.finish();
    }

    fn cancel(&self) {
        let _ = self.handle.request_cancel();
    }
}

/// Opens a background-execution window before the producer starts.
///
/// Construct the matching [`EndWindowTask`] through
/// [`BeginWindowTask::paired_end`] so the token travels through the pair's
/// shared slot.
pub struct BeginWindowTask {
    handle: TaskHandle,
    lifecycle: Arc<dyn BackgroundLifecycle>,
    slot: Arc<Mutex<Option<WindowToken>>>,
}

impl BeginWindowTask {
    pub fn new(lifecycle: Arc<dyn BackgroundLifecycle>) -> Self {
        Self {
            handle: TaskHandle::new("begin-window"),
            lifecycle,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates the end-of-window counterpart sharing this task's token slot.
    pub fn paired_end(&self) -> EndWindowTask {
        EndWindowTask {
            handle: TaskHandle::new("end-window"),
            lifecycle: Arc::clone(&self.lifecycle),
            slot: Arc::clone(&self.slot),
        }
    }
}

#[async_trait]
impl Task for BeginWindowTask {
    fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    async fn main(&self) {
        // Don't open a window for a run that is already being torn down.
        if !self.handle.is_cancelled() {
            let token = self.lifecycle.begin_window();
            *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = token;
        }
        self.handle.finish();
    }

    fn cancel(&self) {
        let _ = self.handle.request_cancel();
    }
}

/// Releases the background-execution window after the producer is terminal.
pub struct EndWindowTask {
    handle: TaskHandle,
    lifecycle: Arc<dyn BackgroundLifecycle>,
    slot: Arc<Mutex<Option<WindowToken>>>,
}

#[async_trait]
impl Task for EndWindowTask {
    fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    async fn main(&self) {
        // Release is cleanup: runs even when the graph was cancelled. An
        // empty slot means the begin task never opened a window.
        let token = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            self.lifecycle.end_window(token);
        }
        self.handle.finish();
    }

    fn cancel(&self) {
        let _ = self.handle.request_cancel();
    }
}

/// Waits for the host to become active before the run completes.
///
/// Finishes immediately if the host is already active. Otherwise suspends on
/// the gate's one-shot activation future, racing it against the task's
/// cancellation token; the subscription is dropped (unregistered) on both
/// paths.
pub struct AwaitForegroundTask {
    handle: TaskHandle,
    gate: Arc<dyn ForegroundGate>,
}

impl AwaitForegroundTask {
    pub fn new(gate: Arc<dyn ForegroundGate>) -> Self {
        Self {
            handle: TaskHandle::new("await-foreground"),
            gate,
        }
    }
}

#[async_trait]
impl Task for AwaitForegroundTask {
    fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    async fn main(&self) {
        if !self.handle.is_cancelled() && !self.gate.is_active() {
            let activated = self.gate.on_activate();
            tokio::select! {
                _ = activated => {}
                _ = self.handle.cancelled() => {}
            }
        }
        self.handle.finish();
    }

    fn cancel(&self) {
        let _ = self.handle.request_cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLifecycle {
        begun: std::sync::atomic::AtomicU64,
        ended: Mutex<Vec<WindowToken>>,
    }

    impl BackgroundLifecycle for CountingLifecycle {
        fn begin_window(&self) -> Option<WindowToken> {
            let n = self
                .begun
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Some(WindowToken::new(n))
        }

        fn end_window(&self, token: WindowToken) {
            self.ended
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(token);
        }
    }

    #[tokio::test]
    async fn token_flows_from_begin_to_end() {
        let lifecycle = Arc::new(CountingLifecycle {
            begun: std::sync::atomic::AtomicU64::new(7),
            ended: Mutex::new(Vec::new()),
        });
        let begin = BeginWindowTask::new(lifecycle.clone());
        let end = begin.paired_end();

        begin.main().await;
        end.main().await;

        let ended = lifecycle
            .ended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        assert_eq!(ended, vec![WindowToken::new(7)]);
        assert!(begin.handle().is_finished());
        assert!(end.handle().is_finished());
    }

    #[tokio::test]
    async fn end_skips_release_when_begin_was_cancelled() {
        let lifecycle = Arc::new(CountingLifecycle {
            begun: std::sync::atomic::AtomicU64::new(0),
            ended: Mutex::new(Vec::new()),
        });
        let begin = BeginWindowTask::new(lifecycle.clone());
        let end = begin.paired_end();

        begin.cancel();
        begin.main().await;
        end.main().await;

        assert!(lifecycle
            .ended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty());
        assert!(end.handle().is_finished());
    }

    #[tokio::test]
    async fn stale_dialog_surface_is_a_silent_success() {
        let surface: Weak<dyn DialogSurface> = {
            struct Nop;
            #[async_trait]
            impl DialogSurface for Nop {
                async fn present(&self) {}
                async fn dismiss(&self) {}
            }
            let strong: Arc<dyn DialogSurface> = Arc::new(Nop);
            Arc::downgrade(&strong)
            // strong dropped here: the weak reference is now dead
        };

        let present = PresentDialogTask::new(surface.clone());
        let dismiss = DismissDialogTask::new(surface);
        present.main().await;
        dismiss.main().await;
        assert!(present.handle().is_finished());
        assert!(dismiss.handle().is_finished());
    }
}
