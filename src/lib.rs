//! # itemflow
//!
//! **itemflow** is a dependent-task execution engine for share-sheet style
//! flows: it wraps an asynchronously produced item behind a
//! synchronous-looking façade, coordinating the producer with optional
//! lifecycle tasks (progress dialog, background-execution window,
//! foreground wait) and user-initiated cooperative cancellation.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!          ┌──────────────────────────────────────────────────────┐
//!          │  ItemProvider (façade)                               │
//!          │  - builds one TaskGraph per run                      │
//!          │  - Bus (broadcast events) + SubscriberSet (fan-out)  │
//!          │  - progress watch (last-value-wins)                  │
//!          │  - user-cancel flag → graph-wide cancellation        │
//!          └───────┬──────────────────────────────────────────────┘
//!                  ▼
//!   present-dialog ──┐                  ┌── dismiss-dialog
//!                    ▼                  │
//!   begin-window ──► provide-item ──────┼── end-window ──► await-foreground
//!                    (ProducerTask)     │
//!                    ▲ progress         ▼ terminal transition
//!          ┌─────────┴────────────────────────────────────────────┐
//!          │  TaskGraph (dependency scheduler)                    │
//!          │  - per-node scheduling future, bounded worker pool   │
//!          │  - no task starts with an unresolved dependency      │
//!          │  - run() returns only when every task is terminal    │
//!          └──────────────────────────────────────────────────────┘
//! ```
//!
//! ### Task lifecycle
//! ```text
//! Pending ──► Ready ──► Running ──► Finished     (terminal, exactly once)
//!
//! cancel() is two-phase:
//!   ├─► request: sets the cancellation flag (idempotent, once per episode)
//!   └─► resolve: the task — or its on_cancel hook — still calls finish()
//!
//! A cancellation path that never produces a finish() deadlocks its graph:
//! requesting cancellation guarantees nothing by itself.
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                          |
//! |-----------------|----------------------------------------------------------|---------------------------------------------|
//! | **Façade**      | One-shot, awaitable production of the item.              | [`ItemProvider`], [`ProvideError`]          |
//! | **Graph**       | Dependency-ordered, one-shot task execution.             | [`TaskGraph`], [`GraphError`]               |
//! | **Tasks**       | Cancelable units with a terminal-state contract.         | [`Task`], [`TaskHandle`], [`ProducerTask`]  |
//! | **Collaborators** | Host-provided dialog / background / foreground hooks.  | [`DialogSurface`], [`BackgroundLifecycle`], [`ForegroundGate`] |
//! | **Events**      | Observe scheduling, progress and cancellation.           | [`Event`], [`Bus`], [`Subscribe`]           |
//! | **Configuration** | Worker cap, bus capacity, dialog mode.                 | [`Config`], [`DialogMode`]                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use itemflow::{ItemProvider, ProducerHandle};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), itemflow::ProvideError> {
//!     let provider = ItemProvider::builder(
//!         "placeholder".to_string(),
//!         |h: ProducerHandle<String>| async move {
//!             for step in 1..=4u32 {
//!                 h.report_progress(f64::from(step) / 4.0);
//!                 tokio::time::sleep(Duration::from_millis(5)).await;
//!             }
//!             h.finish_with_item("prepared item".to_string());
//!         },
//!     )
//!     .with_cancel_hook(|h| h.finish())
//!     .build();
//!
//!     let item = provider.provide().await?;
//!     assert_eq!(item, "prepared item");
//!     assert_eq!(provider.current_progress(), 1.0);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod graph;
mod platform;
mod provider;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{GraphError, ProvideError};
pub use events::{Bus, Event, EventKind};
pub use graph::{NodeId, TaskGraph};
pub use platform::{BackgroundLifecycle, DialogSurface, ForegroundGate, WindowToken};
pub use provider::{DialogMode, ItemProvider, ItemProviderBuilder};
pub use subscribers::{StateTracker, Subscribe, SubscriberSet};
pub use tasks::{
    AwaitForegroundTask, BeginWindowTask, DismissDialogTask, EndWindowTask, PresentDialogTask,
    ProducerHandle, ProducerTask, Task, TaskHandle, TaskId, TaskRef, TaskState,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
