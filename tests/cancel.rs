//! Cancellation semantics: idempotence, the cancel/finish race, and the
//! cooperative wake-up paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use itemflow::{
    AwaitForegroundTask, Bus, Config, ForegroundGate, ProducerTask, Task, TaskGraph, TaskHandle,
    TaskRef, TaskState,
};
use tokio::sync::Notify;

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

#[test]
fn finish_twice_is_a_noop() {
    let handle = TaskHandle::new("t");
    assert!(handle.finish());
    assert!(!handle.finish());
    assert_eq!(handle.state(), TaskState::Finished);
}

#[test]
fn cancel_request_is_once_per_episode() {
    let handle = TaskHandle::new("t");
    assert!(handle.request_cancel());
    assert!(!handle.request_cancel());
    assert!(handle.is_cancelled());
    assert!(!handle.is_finished(), "a request alone is not terminal");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_vs_finish_with_item_has_exactly_one_winner() {
    for _ in 0..200 {
        let bus = Bus::new(4);
        let task: Arc<ProducerTask<u32>> =
            Arc::new(ProducerTask::new("p", bus, |_h| async move {}));
        let handle = task.producer_handle();

        let finisher = tokio::spawn({
            let handle = handle.clone();
            async move { handle.finish_with_item(42) }
        });
        let canceller = tokio::spawn({
            let task = Arc::clone(&task);
            async move { task.cancel() }
        });
        finisher.await.unwrap();
        canceller.await.unwrap();

        assert!(task.handle().is_finished());
        // The item is present iff the producing finish won the race; a late
        // item never overwrites a cancelled finish, and there is no third
        // outcome.
        match task.take_item() {
            Some(item) => assert_eq!(item, 42),
            None => assert!(task.handle().is_cancelled()),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_invoke_the_hook_once() {
    for _ in 0..100 {
        let bus = Bus::new(4);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let task: Arc<ProducerTask<()>> = Arc::new(
            ProducerTask::new("p", bus, |_h| async move {}).with_cancel_hook(move |h| {
                seen.fetch_add(1, Ordering::SeqCst);
                h.finish();
            }),
        );

        let mut joins = Vec::new();
        for _ in 0..4 {
            let task = Arc::clone(&task);
            joins.push(tokio::spawn(async move { task.cancel() }));
        }
        for join in joins {
            join.await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(task.handle().is_finished());
    }
}

#[tokio::test]
async fn await_foreground_wakes_on_activation() {
    let bus = Bus::new(16);
    let gate = Arc::new(MockGate {
        active: AtomicBool::new(false),
        activate: Arc::new(Notify::new()),
    });
    let cfg = Config::default();
    let mut graph = TaskGraph::new(&cfg, bus);
    let wait = Arc::new(AwaitForegroundTask::new(
        Arc::clone(&gate) as Arc<dyn ForegroundGate>
    ));
    graph.add(Arc::clone(&wait) as TaskRef);
    let graph = Arc::new(graph);

    let runner = {
        let graph = Arc::clone(&graph);
        tokio::spawn(async move { graph.run().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!runner.is_finished());

    gate.activate.notify_one();
    runner.await.unwrap().unwrap();
    assert!(wait.handle().is_finished());
    assert!(!wait.handle().is_cancelled());
}

#[tokio::test]
async fn await_foreground_wakes_on_cancellation() {
    let bus = Bus::new(16);
    let gate = Arc::new(MockGate {
        active: AtomicBool::new(false),
        activate: Arc::new(Notify::new()),
    });
    let cfg = Config::default();
    let mut graph = TaskGraph::new(&cfg, bus);
    let wait = Arc::new(AwaitForegroundTask::new(gate as Arc<dyn ForegroundGate>));
    graph.add(Arc::clone(&wait) as TaskRef);
    let graph = Arc::new(graph);

    let runner = {
        let graph = Arc::clone(&graph);
        tokio::spawn(async move { graph.run().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    graph.cancel_all();
    runner.await.unwrap().unwrap();
    assert!(wait.handle().is_finished());
    assert!(wait.handle().is_cancelled());
}
