//! # Dependency scheduler: runs a set of tasks in DAG order.
//!
//! [`TaskGraph`] orders tasks by declared dependency edges and runs them on
//! a bounded worker pool. `run()` returns only when **every** task in the
//! graph is terminal — no task is ever left abandoned in `Running`, and no
//! task starts with an unresolved dependency.
//!
//! ## Execution model
//! ```text
//! for each node:                          (one scheduling future per node)
//!   ├─ await terminal state of every dependency
//!   ├─ already finished? (cancelled while pending) ─► skip start
//!   ├─ mark Ready, acquire worker permit (optional semaphore)
//!   ├─ mark Running, publish TaskStarting
//!   ├─ task.main()                        (must lead to finish(), possibly later)
//!   └─ await the node's own terminal state, publish TaskFinished
//! ```
//!
//! Tasks whose dependencies are simultaneously satisfied run concurrently
//! (subject to the worker cap); order within such a readiness tier is
//! unspecified.
//!
//! ## Rules
//! - Cycles are a caller error: rejected with
//!   [`GraphError::CycleDetected`] before anything starts.
//! - A graph is single-use: the second `run()` returns
//!   [`GraphError::AlreadyRan`].
//! - `cancel_all()` requests cancellation of every non-terminal task;
//!   terminal tasks are unaffected. It never force-terminates: each task
//!   resolves its own request by reaching `finish()`.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::GraphError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{TaskHandle, TaskRef};

/// Index of a task within one graph. Only meaningful for the graph that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

struct Node {
    task: TaskRef,
    deps: Vec<usize>,
}

/// Dependency-ordered set of tasks executed to completion as one unit.
pub struct TaskGraph {
    nodes: Vec<Node>,
    bus: Bus,
    workers: Option<Arc<Semaphore>>,
    ran: AtomicBool,
}

impl TaskGraph {
    /// Creates an empty graph with the config's worker cap and the given bus.
    pub fn new(cfg: &Config, bus: Bus) -> Self {
        Self {
            nodes: Vec::new(),
            bus,
            workers: cfg
                .concurrency_limit()
                .map(|n| Arc::new(Semaphore::new(n))),
            ran: AtomicBool::new(false),
        }
    }

    /// Adds a task and returns its node id.
    pub fn add(&mut self, task: TaskRef) -> NodeId {
        self.nodes.push(Node {
            task,
            deps: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Declares that `node` may only start after `on` is terminal.
    ///
    /// Duplicate edges are tolerated. Cycles are detected at `run()`.
    pub fn add_dependency(&mut self, node: NodeId, on: NodeId) {
        let deps = &mut self.nodes[node.0].deps;
        if !deps.contains(&on.0) {
            deps.push(on.0);
        }
    }

    /// Number of tasks in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the handle of a task by node id.
    pub fn handle(&self, node: NodeId) -> TaskHandle {
        self.nodes[node.0].task.handle().clone()
    }

    /// Requests cancellation of every task that is not yet terminal.
    ///
    /// Idempotent and safe from any thread, including while `run()` is in
    /// flight. Tasks already terminal are unaffected.
    pub fn cancel_all(&self) {
        for node in &self.nodes {
            if !node.task.handle().is_finished() {
                node.task.cancel();
            }
        }
    }

    /// Runs the graph to completion.
    ///
    /// Dispatches tasks whose dependencies are all terminal onto the worker
    /// pool and resolves only once every task has reached its terminal
    /// state. The calling future is blocked for the whole run; this is the
    /// synchronous-looking edge the façade builds on.
    pub async fn run(&self) -> Result<(), GraphError> {
        if self.ran.swap(true, AtomicOrdering::SeqCst) {
            return Err(GraphError::AlreadyRan);
        }
        self.check_acyclic()?;

        let mut set = JoinSet::new();
        for node in &self.nodes {
            let task = Arc::clone(&node.task);
            let deps: Vec<TaskHandle> = node
                .deps
                .iter()
                .map(|&i| self.nodes[i].task.handle().clone())
                .collect();
            let bus = self.bus.clone();
            let workers = self.workers.clone();
            set.spawn(drive_node(task, deps, bus, workers));
        }
        while set.join_next().await.is_some() {}
        Ok(())
    }

    /// Kahn's indegree pass over the declared edges. Any node left
    /// unresolved sits on a cycle.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, node) in self.nodes.iter().enumerate() {
            indegree[i] = node.deps.len();
            for &d in &node.deps {
                dependents[d].push(i);
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut resolved = 0usize;
        while let Some(i) = queue.pop() {
            resolved += 1;
            for &dep in &dependents[i] {
                indegree[dep] -= 1;
                if indegree[dep] == 0 {
                    queue.push(dep);
                }
            }
        }

        if resolved == n {
            Ok(())
        } else {
            let remaining = (0..n)
                .filter(|&i| indegree[i] > 0)
                .map(|i| self.nodes[i].task.name().to_string())
                .collect();
            Err(GraphError::CycleDetected { remaining })
        }
    }
}

/// Scheduling future for one node: dependency wait, start, terminal wait.
async fn drive_node(
    task: TaskRef,
    deps: Vec<TaskHandle>,
    bus: Bus,
    workers: Option<Arc<Semaphore>>,
) {
    for dep in &deps {
        dep.wait_finished().await;
    }

    let handle = task.handle().clone();

    // Cancelled (and resolved) while still pending: nothing to start.
    if !handle.is_finished() {
        handle.mark_ready();
        bus.publish(
            Event::new(EventKind::TaskReady)
                .with_task(handle.name())
                .with_task_id(handle.id().raw()),
        );

        // The permit is held until the node is terminal, so a producer that
        // parks its worker occupies one pool slot for the duration.
        let _permit = match &workers {
            Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
            None => None,
        };

        handle.mark_running();
        bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(handle.name())
                .with_task_id(handle.id().raw()),
        );

        // Race `main` against the terminal transition: a cancellation path
        // may finish the task while its work is still in flight, and the
        // abandoned future is dropped here.
        tokio::select! {
            _ = task.main() => {
                handle.wait_finished().await;
            }
            _ = handle.wait_finished() => {}
        }
    }

    let mut finished = Event::new(EventKind::TaskFinished)
        .with_task(handle.name())
        .with_task_id(handle.id().raw());
    if handle.is_cancelled() {
        finished = finished.with_reason("cancelled");
    }
    bus.publish(finished);
}
