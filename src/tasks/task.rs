//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: an async, cancelable unit with a
//! terminal-state guarantee. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task>` suitable for sharing between the graph and the façade.
//!
//! A task's [`main`](Task::main) is dispatched by the scheduler once all of
//! its dependencies are terminal; the task (not the scheduler) is responsible
//! for eventually driving its own [`TaskHandle::finish`], possibly after
//! `main` has already returned.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tasks::state::TaskHandle;

/// # Asynchronous, cancelable unit with a terminal-state contract.
///
/// A `Task` owns a [`TaskHandle`] holding its identity and state. The
/// scheduler invokes [`main`](Task::main) exactly once, after every declared
/// dependency is terminal, and then waits for the handle's terminal
/// transition — so `main` may return before the task is finished, as long as
/// something it set in motion calls `finish()` later.
///
/// ## Cancellation contract (two-phase)
/// [`cancel`](Task::cancel) only *requests*: it flips the cancellation flag
/// and lets the task (or its hook) resolve the request by reaching
/// `finish()`. The default implementation has no in-flight work to abandon,
/// so it finishes straight away; implementors with cleanup override this.
/// Every cancellation path **must** eventually produce a `finish()`, or the
/// graph containing the task deadlocks.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns the shared handle carrying this task's identity and state.
    fn handle(&self) -> &TaskHandle;

    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str {
        self.handle().name()
    }

    /// Performs the task's unit of work on a scheduler worker.
    ///
    /// Invoked at most once, and only after all dependencies are terminal.
    /// Not invoked at all if the task was finished before it could start
    /// (e.g. cancelled while still pending).
    async fn main(&self);

    /// Requests cooperative cancellation.
    ///
    /// May be called at any time, from any thread, any number of times;
    /// only the first request has an effect. The default resolves the
    /// request immediately by finishing the task.
    fn cancel(&self) {
        if self.handle().request_cancel() {
            self.handle().finish();
        }
    }
}

/// Shared reference to a task (`Arc<dyn Task>`).
pub type TaskRef = Arc<dyn Task>;
