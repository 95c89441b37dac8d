//! # Producer task: the value-producing unit of the graph.
//!
//! [`ProducerTask`] wraps a caller-supplied `provide` closure that is invoked
//! exactly once, on a scheduler worker, when the task starts. The closure
//! receives a [`ProducerHandle`] and is responsible for eventually calling
//! [`ProducerHandle::finish_with_item`] (or plain `finish`) — the engine
//! imposes no timeout, so a closure that never finishes deadlocks its graph.
//!
//! While running, the closure may call [`ProducerHandle::report_progress`];
//! reports flow into a `watch` channel (last-value-wins) and onto the event
//! bus, and are ignored once the task is terminal.
//!
//! ## Cancellation
//! An optional `on_cancel` hook is invoked exactly once if cancellation is
//! requested before the task is terminal; without a hook, cancellation
//! degrades to an immediate `finish()` with no item. The hook inherits the
//! finish obligation: skipping it leaves the graph waiting forever.
//!
//! If `cancel()` races with the closure's own `finish_with_item`, the first
//! terminal transition wins; an item arriving after a cancelled finish is
//! discarded, never stored partially.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::state::TaskHandle;
use crate::tasks::task::Task;

type ProvideFn<T> = dyn Fn(ProducerHandle<T>) -> BoxFuture<'static, ()> + Send + Sync;
type CancelFn<T> = dyn Fn(ProducerHandle<T>) + Send + Sync;

struct ProducerShared<T> {
    handle: TaskHandle,
    bus: Bus,
    item: Mutex<Option<T>>,
    progress: watch::Sender<f64>,
    on_cancel: Mutex<Option<Box<CancelFn<T>>>>,
}

impl<T: Send + 'static> ProducerShared<T> {
    /// Resolves a cancellation request: first request wins, the hook (taken
    /// at most once) or a direct finish settles the task.
    fn run_cancel(self: &Arc<Self>) {
        if !self.handle.request_cancel() {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::CancelRequested)
                .with_task(self.handle.name())
                .with_task_id(self.handle.id().raw()),
        );
        if self.handle.is_finished() {
            return;
        }
        let hook = self
            .on_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match hook {
            Some(hook) => hook(ProducerHandle {
                shared: Arc::clone(self),
            }),
            None => {
                self.handle.finish();
            }
        }
    }
}

/// Controller handed to the `provide` closure and the `on_cancel` hook.
///
/// Cheap to clone; all methods are safe from any thread, including inside a
/// synchronous hook. This is the only surface through which user code drives
/// the producer task.
pub struct ProducerHandle<T> {
    shared: Arc<ProducerShared<T>>,
}

impl<T> Clone for ProducerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> ProducerHandle<T> {
    /// Stores the produced item and finishes the task.
    ///
    /// If another path already finished the task (a cancelled finish, or an
    /// earlier `finish_with_item`), the item is discarded: the slot is never
    /// overwritten after a terminal transition.
    pub fn finish_with_item(&self, item: T) {
        let mut slot = self
            .shared
            .item
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.shared.handle.finish() {
            *slot = Some(item);
        }
    }

    /// Finishes the task with no item. Idempotent.
    pub fn finish(&self) {
        self.shared.handle.finish();
    }

    /// Requests cancellation of this producer (hook path included).
    pub fn cancel(&self) {
        self.shared.run_cancel();
    }

    /// Reports fractional progress in `[0, 1]`.
    ///
    /// Values are clamped; non-finite values and reports after the task is
    /// terminal are ignored. Delivery is last-value-wins: an observer sees
    /// the most recent report, with no buffering guarantee beyond that.
    pub fn report_progress(&self, progress: f64) {
        if !progress.is_finite() || self.shared.handle.is_finished() {
            return;
        }
        let p = progress.clamp(0.0, 1.0);
        self.shared.progress.send_replace(p);
        self.shared.bus.publish(
            Event::new(EventKind::ProgressReported)
                .with_task(self.shared.handle.name())
                .with_task_id(self.shared.handle.id().raw())
                .with_progress(p),
        );
    }

    /// Returns the last reported progress value.
    pub fn progress(&self) -> f64 {
        *self.shared.progress.borrow()
    }

    /// True once cancellation has been requested for this producer.
    pub fn is_cancelled(&self) -> bool {
        self.shared.handle.is_cancelled()
    }

    /// Resolves when cancellation is requested; for `select!`-style
    /// cooperative work inside the `provide` closure.
    pub async fn cancelled(&self) {
        self.shared.handle.cancelled().await;
    }
}

/// Task that invokes user-supplied work and yields a produced value.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use itemflow::{Bus, ProducerHandle, ProducerTask};
///
/// let bus = Bus::new(16);
/// let task = ProducerTask::new("provide-item", bus, |h: ProducerHandle<String>| async move {
///     h.report_progress(0.5);
///     h.finish_with_item("payload".to_string());
/// });
/// assert_eq!(task.name(), "provide-item");
/// # use itemflow::Task;
/// ```
pub struct ProducerTask<T> {
    shared: Arc<ProducerShared<T>>,
    provide: Box<ProvideFn<T>>,
}

impl<T: Send + 'static> ProducerTask<T> {
    /// Creates a producer around a `provide` closure.
    ///
    /// The closure builds a fresh future when the task starts; the future's
    /// return does **not** finish the task — only an explicit
    /// `finish_with_item` / `finish` does, so work may outlive the closure
    /// body (timers, spawned jobs) as long as it settles the handle.
    pub fn new<F, Fut>(name: impl Into<Arc<str>>, bus: Bus, provide: F) -> Self
    where
        F: Fn(ProducerHandle<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (progress, _) = watch::channel(0.0);
        Self {
            shared: Arc::new(ProducerShared {
                handle: TaskHandle::new(name),
                bus,
                item: Mutex::new(None),
                progress,
                on_cancel: Mutex::new(None),
            }),
            provide: Box::new(move |h| Box::pin(provide(h))),
        }
    }

    /// Attaches a cancellation hook, invoked exactly once if cancellation is
    /// requested before the task is terminal.
    ///
    /// The hook must ensure `finish()` is eventually called on the handle it
    /// receives, directly or through work it sets in motion.
    pub fn with_cancel_hook<F>(self, hook: F) -> Self
    where
        F: Fn(ProducerHandle<T>) + Send + Sync + 'static,
    {
        *self
            .shared
            .on_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
        self
    }

    /// Returns a controller handle for this producer.
    pub fn producer_handle(&self) -> ProducerHandle<T> {
        ProducerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns a receiver observing progress reports (last-value-wins).
    pub fn progress_watch(&self) -> watch::Receiver<f64> {
        self.shared.progress.subscribe()
    }

    /// Moves the produced item out of the slot.
    ///
    /// Only meaningful once the task is terminal; before that the slot is
    /// empty by contract.
    pub fn take_item(&self) -> Option<T> {
        self.shared
            .item
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl<T: Send + 'static> Task for ProducerTask<T> {
    fn handle(&self) -> &TaskHandle {
        &self.shared.handle
    }

    async fn main(&self) {
        // Cancelled after being scheduled but before the closure ran: settle
        // without invoking the closure at all.
        if self.shared.handle.is_cancelled() {
            self.shared.handle.finish();
            return;
        }
        (self.provide)(self.producer_handle()).await;
    }

    fn cancel(&self) {
        self.shared.run_cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::task::Task;

    #[tokio::test]
    async fn produces_item_and_progress() {
        let bus = Bus::new(16);
        let task = ProducerTask::new("p", bus, |h: ProducerHandle<&'static str>| async move {
            h.report_progress(0.25);
            h.finish_with_item("x");
        });
        task.main().await;
        assert!(task.handle().is_finished());
        assert_eq!(task.take_item(), Some("x"));
        assert_eq!(*task.progress_watch().borrow(), 0.25);
    }

    #[tokio::test]
    async fn progress_after_finish_is_ignored() {
        let bus = Bus::new(16);
        let task = ProducerTask::new("p", bus, |h: ProducerHandle<()>| async move {
            h.finish();
            h.report_progress(0.9);
        });
        task.main().await;
        assert_eq!(*task.progress_watch().borrow(), 0.0);
    }

    #[tokio::test]
    async fn cancel_without_hook_finishes_with_no_item() {
        let bus = Bus::new(16);
        let task: ProducerTask<()> =
            ProducerTask::new("p", bus, |_h| async move { unreachable!("never started") });
        task.cancel();
        assert!(task.handle().is_finished());
        assert!(task.handle().is_cancelled());
        assert_eq!(task.take_item(), None);
    }

    #[tokio::test]
    async fn late_item_after_cancelled_finish_is_discarded() {
        let bus = Bus::new(16);
        let task: ProducerTask<&'static str> = ProducerTask::new("p", bus, |_h| async move {});
        let handle = task.producer_handle();
        task.cancel(); // no hook: cancelled finish
        handle.finish_with_item("late");
        assert_eq!(task.take_item(), None);
    }

    #[tokio::test]
    async fn hook_runs_once_even_for_repeat_cancels() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let bus = Bus::new(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let task: ProducerTask<()> = ProducerTask::new("p", bus, |_h| async move {})
            .with_cancel_hook(move |h| {
                seen.fetch_add(1, Ordering::SeqCst);
                h.finish();
            });
        task.cancel();
        task.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(task.handle().is_finished());
    }
}
