//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] — trait for cancelable units with a terminal-state contract
//! - [`TaskRef`] — shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskHandle`], [`TaskState`], [`TaskId`] — per-task identity and state
//! - [`ProducerTask`], [`ProducerHandle`] — the value-producing task
//! - lifecycle tasks bracketing the producer (dialog, background window,
//!   foreground wait)

mod lifecycle;
mod producer;
mod state;
mod task;

pub use lifecycle::{
    AwaitForegroundTask, BeginWindowTask, DismissDialogTask, EndWindowTask, PresentDialogTask,
};
pub use producer::{ProducerHandle, ProducerTask};
pub use state::{TaskHandle, TaskId, TaskState};
pub use task::{Task, TaskRef};
