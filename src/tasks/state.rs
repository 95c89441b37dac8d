//! # Task identity, state machine and shared handle.
//!
//! Every task in a graph owns a [`TaskHandle`]: a cheaply cloneable cell
//! holding the task's identity, its [`TaskState`], and its cancellation
//! token. The scheduler, the task itself, and external cancellers all talk
//! to the same handle.
//!
//! ## State machine
//! ```text
//! Pending ──► Ready ──► Running ──► Finished
//!    │          │          │           ▲
//!    └──────────┴──────────┴── finish()┘   (idempotent, first call wins)
//! ```
//!
//! Cancellation is a **flag**, not a state: [`TaskHandle::request_cancel`]
//! never reaches `Finished` by itself. Whoever requests cancellation (or the
//! task's hook) is responsible for a downstream `finish()`; a cancelled task
//! still terminates by reaching `Finished`, and `is_cancelled()` is what
//! distinguishes a cancelled finish from a normal one.
//!
//! ## Rules
//! - `finish()` more than once is a no-op, not an error — tolerated so a
//!   cancellation path and a normal-completion path may race.
//! - `mark_ready` / `mark_running` silently no-op on an already-finished
//!   task (cancellation can finish a task before it ever starts).
//! - The terminal transition wakes every `wait_finished()` waiter; this is
//!   the edge that releases dependent tasks in the graph.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Process-unique task id counter.
static TASK_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(TASK_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Execution state of a task.
///
/// `Finished` is the only terminal state; every task reaches it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created; dependencies not yet all terminal.
    Pending,
    /// All dependencies terminal; eligible to start.
    Ready,
    /// `main()` dispatched onto a worker.
    Running,
    /// Terminal. Set by `finish()`, whether the task completed normally or
    /// resolved a cancellation request.
    Finished,
}

impl TaskState {
    /// True for the terminal state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished)
    }
}

struct HandleInner {
    id: TaskId,
    name: Arc<str>,
    state: watch::Sender<TaskState>,
    token: CancellationToken,
    cancel_requested: AtomicBool,
}

/// Shared per-task cell: identity, state, cancellation.
///
/// Clones share the same underlying cell. The handle is safe to use from any
/// thread; all transitions are at-most-once where the contract requires it.
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<HandleInner>,
}

impl TaskHandle {
    /// Creates a fresh handle in `Pending` with a new process-unique id.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let (state, _) = watch::channel(TaskState::Pending);
        Self {
            inner: Arc::new(HandleInner {
                id: TaskId::next(),
                name: name.into(),
                state,
                token: CancellationToken::new(),
                cancel_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the task's id.
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    /// Returns the task's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the current state.
    pub fn state(&self) -> TaskState {
        *self.inner.state.borrow()
    }

    /// True once the task is terminal.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Advances `Pending → Ready`. Returns whether the transition happened.
    ///
    /// No-op on a task that is already ready, running or finished.
    pub fn mark_ready(&self) -> bool {
        self.inner.state.send_if_modified(|s| {
            if *s == TaskState::Pending {
                *s = TaskState::Ready;
                true
            } else {
                false
            }
        })
    }

    /// Advances `Ready → Running`. Returns whether the transition happened.
    pub fn mark_running(&self) -> bool {
        self.inner.state.send_if_modified(|s| {
            if *s == TaskState::Ready {
                *s = TaskState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Moves the task to its terminal state.
    ///
    /// Idempotent: returns `true` only for the call that actually performed
    /// the transition. The first caller wins any race between a cancellation
    /// path and a normal-completion path; later calls are silent no-ops.
    pub fn finish(&self) -> bool {
        self.inner.state.send_if_modified(|s| {
            if s.is_terminal() {
                false
            } else {
                *s = TaskState::Finished;
                true
            }
        })
    }

    /// Requests cooperative cancellation.
    ///
    /// Sets the cancellation token and returns `true` exactly once per
    /// handle; repeat requests return `false` and have no further effect.
    /// This never finishes the task by itself — the caller (or the task's
    /// hook) must still drive it to `finish()`.
    pub fn request_cancel(&self) -> bool {
        if self
            .inner
            .cancel_requested
            .swap(true, AtomicOrdering::SeqCst)
        {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Resolves once the task is terminal.
    ///
    /// This is the dependency-release edge: the scheduler awaits this on
    /// every dependency before starting a task.
    pub async fn wait_finished(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives inside this handle, so wait_for cannot error.
        let _ = rx.wait_for(|s| s.is_terminal()).await;
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
