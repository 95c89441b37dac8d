//! # Item provider façade.
//!
//! [`ItemProvider`] is the synchronous-looking entry point consumed by the
//! share-sheet host: it wraps the asynchronously produced item behind one
//! awaited call. Per run it builds a task graph (the producer task plus the
//! lifecycle tasks whose collaborators are wired), runs the graph to
//! completion, and returns the produced item or the reason there is none.
//!
//! ## Graph shape
//! ```text
//!   present-dialog ──┐                 ┌── dismiss-dialog
//!                    ▼                 │
//!   begin-window ──► provide-item ─────┼── end-window ──► await-foreground
//!                    (producer task)   │
//!                    ▲ progress        ▼ terminal transition
//! ```
//! Present-dialog and begin-window are dependencies of the producer;
//! dismiss-dialog and end-window depend on it, so they run after its
//! terminal transition whether it finished normally or was cancelled.
//!
//! ## Blocking contract
//! `provide()` resolves only once every task in the graph is terminal. The
//! caller that must stay responsive should not await it directly — the
//! share-sheet host is expected to drive it from a worker context.
//!
//! ## Cancellation
//! [`ItemProvider::cancel`] flips the run-wide user-cancel flag and requests
//! cancellation of every non-terminal task. A cancel that arrives before the
//! graph exists is remembered and applied the moment `provide()` builds one.
//! After a cancelled run the optional host surface is dismissed and the
//! result is [`ProvideError::Cancelled`]; an item produced after the
//! cancellation was observed is discarded.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::config::Config;
use crate::error::ProvideError;
use crate::events::{Bus, Event, EventKind};
use crate::graph::TaskGraph;
use crate::platform::{BackgroundLifecycle, DialogSurface, ForegroundGate};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{
    AwaitForegroundTask, BeginWindowTask, DismissDialogTask, PresentDialogTask, ProducerHandle,
    ProducerTask, TaskRef,
};

/// Whether the progress dialog lifecycle tasks are wired into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    /// Present the dialog before the producer and dismiss it after.
    Enabled,
    /// Run the bare producer graph; no dialog tasks are added.
    Disabled,
}

type BoxProvideFn<T> = Box<dyn Fn(ProducerHandle<T>) -> BoxFuture<'static, ()> + Send + Sync>;
type BoxCancelFn<T> = Box<dyn Fn(ProducerHandle<T>) + Send + Sync>;

/// User-supplied closures, consumed by the single `provide()` run.
struct Setup<T> {
    provide: BoxProvideFn<T>,
    on_cancel: Option<BoxCancelFn<T>>,
}

/// Builder for [`ItemProvider`].
pub struct ItemProviderBuilder<T> {
    placeholder: T,
    cfg: Config,
    setup: Setup<T>,
    dialog: Option<Weak<dyn DialogSurface>>,
    host: Option<Weak<dyn DialogSurface>>,
    background: Option<Arc<dyn BackgroundLifecycle>>,
    foreground: Option<Arc<dyn ForegroundGate>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T: Send + 'static> ItemProviderBuilder<T> {
    /// Attaches a cancellation hook forwarded to the producer task.
    pub fn with_cancel_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(ProducerHandle<T>) + Send + Sync + 'static,
    {
        self.setup.on_cancel = Some(Box::new(hook));
        self
    }

    /// Wires the modal progress surface (held weakly; resolved at use time).
    pub fn with_dialog(mut self, surface: Weak<dyn DialogSurface>) -> Self {
        self.dialog = Some(surface);
        self
    }

    /// Wires the host's own surface, dismissed after a cancelled run.
    pub fn with_host_surface(mut self, surface: Weak<dyn DialogSurface>) -> Self {
        self.host = Some(surface);
        self
    }

    /// Wires the background-execution window collaborator.
    pub fn with_background(mut self, lifecycle: Arc<dyn BackgroundLifecycle>) -> Self {
        self.background = Some(lifecycle);
        self
    }

    /// Wires the foreground-state collaborator.
    pub fn with_foreground(mut self, gate: Arc<dyn ForegroundGate>) -> Self {
        self.foreground = Some(gate);
        self
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Registers event subscribers for the run.
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subs;
        self
    }

    /// Builds the provider.
    ///
    /// Must be called from within a tokio runtime when subscribers are
    /// registered (their workers and the bus listener are spawned here).
    pub fn build(self) -> ItemProvider<T> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        if !subs.is_empty() {
            let mut rx = bus.subscribe();
            let set = Arc::clone(&subs);
            tokio::spawn(async move {
                while let Ok(ev) = rx.recv().await {
                    set.emit(&ev);
                }
            });
        }

        // Placeholder channel until the run installs the producer's watch.
        let (_tx, rx) = watch::channel(0.0);

        ItemProvider {
            placeholder: self.placeholder,
            cfg: self.cfg,
            bus,
            subs,
            setup: Mutex::new(Some(self.setup)),
            dialog: self.dialog,
            host: self.host,
            background: self.background,
            foreground: self.foreground,
            user_cancelled: AtomicBool::new(false),
            active: Mutex::new(None),
            progress: Mutex::new(rx),
        }
    }
}

/// Synchronous-looking wrapper around the asynchronously produced item.
///
/// ## Example
/// ```rust
/// use itemflow::{ItemProvider, ProducerHandle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), itemflow::ProvideError> {
/// let provider = ItemProvider::builder("placeholder".to_string(), |h: ProducerHandle<String>| async move {
///     h.report_progress(1.0);
///     h.finish_with_item("the real item".to_string());
/// })
/// .build();
///
/// let item = provider.provide().await?;
/// assert_eq!(item, "the real item");
/// assert_eq!(provider.current_progress(), 1.0);
/// # Ok(())
/// # }
/// ```
pub struct ItemProvider<T> {
    placeholder: T,
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    setup: Mutex<Option<Setup<T>>>,
    dialog: Option<Weak<dyn DialogSurface>>,
    host: Option<Weak<dyn DialogSurface>>,
    background: Option<Arc<dyn BackgroundLifecycle>>,
    foreground: Option<Arc<dyn ForegroundGate>>,
    user_cancelled: AtomicBool,
    active: Mutex<Option<Arc<TaskGraph>>>,
    progress: Mutex<watch::Receiver<f64>>,
}

impl<T: Send + 'static> ItemProvider<T> {
    /// Starts a builder from the placeholder value and the `provide`
    /// closure.
    ///
    /// The closure is invoked exactly once, on a graph worker, when the
    /// producer task starts; it must eventually call `finish_with_item` (or
    /// `finish`) on the handle it receives.
    pub fn builder<F, Fut>(placeholder: T, provide: F) -> ItemProviderBuilder<T>
    where
        F: Fn(ProducerHandle<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        ItemProviderBuilder {
            placeholder,
            cfg: Config::default(),
            setup: Setup {
                provide: Box::new(move |h| Box::pin(provide(h))),
                on_cancel: None,
            },
            dialog: None,
            host: None,
            background: None,
            foreground: None,
            subscribers: Vec::new(),
        }
    }

    /// Produces the item: builds the graph, runs it to completion, inspects
    /// the outcome.
    ///
    /// One-shot: the first call consumes the producer closures; later calls
    /// return [`ProvideError::Consumed`].
    pub async fn provide(&self) -> Result<T, ProvideError> {
        let setup = self
            .setup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ProvideError::Consumed)?;

        let producer = ProducerTask::new("provide-item", self.bus.clone(), setup.provide);
        let producer = Arc::new(match setup.on_cancel {
            Some(hook) => producer.with_cancel_hook(hook),
            None => producer,
        });
        *self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = producer.progress_watch();

        let graph = Arc::new(self.build_graph(Arc::clone(&producer) as TaskRef));
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&graph));

        // A cancel that arrived before the graph existed applies to it now.
        if self.user_cancelled.load(AtomicOrdering::SeqCst) {
            graph.cancel_all();
        }

        let run = graph.run().await;
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
        run?;

        if self.user_cancelled.load(AtomicOrdering::SeqCst) {
            self.bus.publish(Event::new(EventKind::GraphCancelled));
            // Mirror the cancelled flow's teardown of the host surface.
            if let Some(host) = self.host.as_ref().and_then(Weak::upgrade) {
                host.dismiss().await;
            }
            return Err(ProvideError::Cancelled);
        }

        self.bus.publish(Event::new(EventKind::GraphCompleted));
        producer.take_item().ok_or(ProvideError::NoItem)
    }

    /// Assembles the producer plus the lifecycle tasks that have
    /// collaborators wired.
    fn build_graph(&self, producer: TaskRef) -> TaskGraph {
        let mut graph = TaskGraph::new(&self.cfg, self.bus.clone());
        let producer_node = graph.add(producer);

        if self.cfg.dialog == DialogMode::Enabled {
            if let Some(surface) = &self.dialog {
                let present = Arc::new(PresentDialogTask::new(surface.clone()));
                let dismiss = Arc::new(DismissDialogTask::new(surface.clone()));
                let present_node = graph.add(present);
                let dismiss_node = graph.add(dismiss);
                graph.add_dependency(producer_node, present_node);
                graph.add_dependency(dismiss_node, producer_node);
            }
        }

        // The foreground wait anchors on the end-window task when one
        // exists, otherwise directly on the producer.
        let mut tail = producer_node;
        if let Some(lifecycle) = &self.background {
            let begin = Arc::new(BeginWindowTask::new(Arc::clone(lifecycle)));
            let end = Arc::new(begin.paired_end());
            let begin_node = graph.add(begin);
            let end_node = graph.add(end);
            graph.add_dependency(producer_node, begin_node);
            graph.add_dependency(end_node, producer_node);
            tail = end_node;
        }
        if let Some(gate) = &self.foreground {
            let wait = Arc::new(AwaitForegroundTask::new(Arc::clone(gate)));
            let wait_node = graph.add(wait);
            graph.add_dependency(wait_node, tail);
        }

        graph
    }

    /// Requests cancellation of the whole run.
    ///
    /// Cancels every non-terminal task in the current graph; remembered and
    /// applied at graph construction if no graph is running yet. Idempotent.
    pub fn cancel(&self) {
        self.user_cancelled.store(true, AtomicOrdering::SeqCst);
        let graph = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(graph) = graph {
            graph.cancel_all();
        }
    }

    /// True once `cancel()` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.user_cancelled.load(AtomicOrdering::SeqCst)
    }

    /// Returns the placeholder value handed to the builder.
    pub fn placeholder(&self) -> &T {
        &self.placeholder
    }

    /// Last known progress of the producer, in `[0, 1]`.
    ///
    /// Reads the most recent report; `0.0` before the run starts.
    pub fn current_progress(&self) -> f64 {
        *self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .borrow()
    }

    /// Returns a receiver observing progress reports, for an external
    /// display.
    ///
    /// Receivers obtained before `provide()` observe the pre-run channel
    /// only; obtain one after the run starts (or use
    /// [`Subscribe`](crate::Subscribe) events) for live reports.
    pub fn progress_watch(&self) -> watch::Receiver<f64> {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered event subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }
}
