//! Façade-level scenarios: the full lifecycle graphs the provider builds,
//! progress reporting, cancellation flows, collaborator wiring.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use itemflow::{
    BackgroundLifecycle, Config, DialogMode, DialogSurface, ForegroundGate, ItemProvider,
    ProducerHandle, StateTracker, Subscribe, WindowToken,
};
use tokio::sync::Notify;

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn position(log: &Log, entry: &str) -> usize {
    let entries = log.lock().unwrap().clone();
    entries
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("entry {entry:?} not recorded in {entries:?}"))
}

async fn wait_for_entry(log: &Log, entry: &str) {
    for _ in 0..200 {
        if log.lock().unwrap().iter().any(|e| e == entry) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("entry {entry:?} never recorded");
}

struct MockDialog {
    log: Log,
}

#[async_trait]
impl DialogSurface for MockDialog {
    async fn present(&self) {
        record(&self.log, "present");
    }

    async fn dismiss(&self) {
        record(&self.log, "dismiss");
    }
}

struct MockBackground {
    log: Log,
    next: AtomicU64,
}

impl BackgroundLifecycle for MockBackground {
    fn begin_window(&self) -> Option<WindowToken> {
        record(&self.log, "begin");
        Some(WindowToken::new(self.next.fetch_add(1, Ordering::SeqCst)))
    }

    fn end_window(&self, _token: WindowToken) {
        record(&self.log, "end");
    }
}

struct MockGate {
    active: AtomicBool,
    activate: Arc<Notify>,
}

impl ForegroundGate for MockGate {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn on_activate(&self) -> BoxFuture<'static, ()> {
        let notify = Arc::clone(&self.activate);
        Box::pin(async move { notify.notified().await })
    }
}

fn weak_surface(dialog: &Arc<MockDialog>) -> Weak<dyn DialogSurface> {
    let strong: Arc<dyn DialogSurface> = Arc::clone(dialog) as Arc<dyn DialogSurface>;
    Arc::downgrade(&strong)
}

#[tokio::test]
async fn scenario_progress_steps_then_item() {
    let log = new_log();
    let dialog = Arc::new(MockDialog {
        log: Arc::clone(&log),
    });

    let produce_log = Arc::clone(&log);
    let provider = ItemProvider::builder(
        "placeholder",
        move |h: ProducerHandle<&'static str>| {
            let log = Arc::clone(&produce_log);
            async move {
                for step in 1..=10u32 {
                    h.report_progress(f64::from(step) / 10.0);
                }
                record(&log, "produce");
                h.finish_with_item("X");
            }
        },
    )
    .with_dialog(weak_surface(&dialog))
    .build();

    let item = provider.provide().await.expect("run yields the item");
    assert_eq!(item, "X");
    assert_eq!(provider.current_progress(), 1.0);
    assert_eq!(*provider.placeholder(), "placeholder");

    // Present strictly before the producer, dismiss strictly after.
    assert!(position(&log, "present") < position(&log, "produce"));
    assert!(position(&log, "produce") < position(&log, "dismiss"));
}

#[tokio::test]
async fn scenario_cancel_before_producer_runs() {
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hook_calls);

    let provider = ItemProvider::builder((), |_h: ProducerHandle<()>| async move {
        panic!("producer must never run after an early cancel");
    })
    .with_cancel_hook(move |h| {
        seen.fetch_add(1, Ordering::SeqCst);
        h.finish();
    })
    .build();

    provider.cancel();
    let err = provider.provide().await.expect_err("run is cancelled");
    assert!(err.is_cancelled());
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_dialog_disabled_still_yields_item() {
    let log = new_log();
    let dialog = Arc::new(MockDialog {
        log: Arc::clone(&log),
    });

    let provider = ItemProvider::builder(0u32, |h: ProducerHandle<u32>| async move {
        h.finish_with_item(7);
    })
    .with_dialog(weak_surface(&dialog))
    .with_config(Config {
        dialog: DialogMode::Disabled,
        ..Config::default()
    })
    .build();

    assert_eq!(provider.provide().await.expect("bare graph runs"), 7);
    // Dialog wired but mode disabled: no surface activity at all.
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scenario_background_window_brackets_a_cancelled_producer() {
    let log = new_log();
    let background = Arc::new(MockBackground {
        log: Arc::clone(&log),
        next: AtomicU64::new(1),
    });

    let produce_log = Arc::clone(&log);
    let hook_log = Arc::clone(&log);
    let provider = Arc::new(
        ItemProvider::builder((), move |h: ProducerHandle<()>| {
            let log = Arc::clone(&produce_log);
            async move {
                record(&log, "produce:start");
                // Parks until the cancellation hook settles the task.
                loop {
                    if h.is_cancelled() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        })
        .with_cancel_hook(move |h| {
            record(&hook_log, "hook");
            h.finish();
        })
        .with_background(background)
        .build(),
    );

    let runner = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move { provider.provide().await })
    };

    wait_for_entry(&log, "produce:start").await;
    provider.cancel();

    let err = runner
        .await
        .expect("runner joins")
        .expect_err("cancelled run");
    assert!(err.is_cancelled());

    // Begin strictly before the producer started, end strictly after the
    // cancellation settled it.
    assert!(position(&log, "begin") < position(&log, "produce:start"));
    assert!(position(&log, "hook") < position(&log, "end"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_waits_for_foreground_activation() {
    let gate = Arc::new(MockGate {
        active: AtomicBool::new(false),
        activate: Arc::new(Notify::new()),
    });

    let provider = Arc::new(
        ItemProvider::builder(0u32, |h: ProducerHandle<u32>| async move {
            h.finish_with_item(1);
        })
        .with_foreground(Arc::clone(&gate) as Arc<dyn ForegroundGate>)
        .build(),
    );

    let runner = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move { provider.provide().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished(), "run must wait for activation");

    gate.activate.notify_one();
    let item = runner.await.expect("runner joins").expect("run resolves");
    assert_eq!(item, 1);
}

#[tokio::test]
async fn foreground_already_active_does_not_wait() {
    let gate = Arc::new(MockGate {
        active: AtomicBool::new(true),
        activate: Arc::new(Notify::new()),
    });

    let provider = ItemProvider::builder(0u32, |h: ProducerHandle<u32>| async move {
        h.finish_with_item(2);
    })
    .with_foreground(gate as Arc<dyn ForegroundGate>)
    .build();

    assert_eq!(provider.provide().await.expect("no wait"), 2);
}

#[tokio::test]
async fn provider_is_single_use() {
    let provider = ItemProvider::builder((), |h: ProducerHandle<()>| async move {
        h.finish();
    })
    .build();

    // First run: no item supplied, explicit outcome instead of silent nil.
    let err = provider.provide().await.expect_err("no item");
    assert_eq!(err.as_label(), "provide_no_item");

    let err = provider.provide().await.expect_err("consumed");
    assert_eq!(err.as_label(), "provide_consumed");
}

#[tokio::test]
async fn cancelled_run_dismisses_the_host_surface() {
    let log = new_log();
    let host = Arc::new(MockDialog {
        log: Arc::clone(&log),
    });

    let provider = ItemProvider::builder((), |_h: ProducerHandle<()>| async move {})
        .with_host_surface(weak_surface(&host))
        .build();

    provider.cancel();
    let err = provider.provide().await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert_eq!(log.lock().unwrap().as_slice(), ["dismiss"]);
}

#[tokio::test]
async fn no_task_is_left_open_after_a_run() {
    let tracker = Arc::new(StateTracker::new());
    let dialog = Arc::new(MockDialog { log: new_log() });

    let provider = ItemProvider::builder(0u32, |h: ProducerHandle<u32>| async move {
        h.report_progress(1.0);
        h.finish_with_item(3);
    })
    .with_dialog(weak_surface(&dialog))
    .with_subscribers(vec![Arc::clone(&tracker) as Arc<dyn Subscribe>])
    .build();

    assert_eq!(provider.provide().await.expect("runs"), 3);

    // Event delivery is asynchronous; give the fan-out a moment.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        tracker.snapshot().await.is_empty(),
        "every task must be terminal"
    );
}
