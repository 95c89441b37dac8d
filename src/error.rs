//! Error types used by the itemflow engine.
//!
//! This module defines two error enums:
//!
//! - [`GraphError`] — errors raised by the task-graph scheduler itself.
//! - [`ProvideError`] — outcomes of a façade run that did not yield an item.
//!
//! Both types provide `as_label` helpers for logging/metrics.
//!
//! Note the taxonomy deliberately has no channel for producer failures: a
//! producer that cannot supply an item finishes without one, which surfaces
//! as [`ProvideError::NoItem`]. Stale collaborator references (a dialog
//! surface torn down before the graph runs) are silent no-ops, not errors.
//! A producer that never calls `finish()` deadlocks its graph permanently —
//! that is a documented caller obligation, not a guarded failure mode.

use thiserror::Error;

/// # Errors produced by the task-graph scheduler.
///
/// These represent caller errors in how a graph was assembled or driven,
/// not failures of the tasks inside it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GraphError {
    /// The declared dependency edges contain a cycle.
    ///
    /// Cycles are a caller error: the graph is rejected before any task
    /// starts, so no task observes a partial run.
    #[error("dependency cycle detected; unresolved tasks: {remaining:?}")]
    CycleDetected {
        /// Names of the tasks that could not be ordered.
        remaining: Vec<String>,
    },

    /// The graph was already run once.
    ///
    /// A graph is consumed in one shot: built, run to completion, discarded.
    #[error("task graph already ran; graphs are single-use")]
    AlreadyRan,
}

impl GraphError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use itemflow::GraphError;
    ///
    /// let err = GraphError::AlreadyRan;
    /// assert_eq!(err.as_label(), "graph_already_ran");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GraphError::CycleDetected { .. } => "graph_cycle_detected",
            GraphError::AlreadyRan => "graph_already_ran",
        }
    }
}

/// # Outcomes of a façade run that produced no item.
///
/// [`ItemProvider::provide`](crate::ItemProvider::provide) returns
/// `Result<T, ProvideError>` so that "no value" always carries its cause
/// instead of degrading to a silent `None`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProvideError {
    /// The run ended in user-requested cancellation.
    ///
    /// An item produced after cancellation was observed is discarded, so
    /// this variant never carries a partial value.
    #[error("run cancelled by user request")]
    Cancelled,

    /// The producer finished without supplying an item.
    #[error("producer finished without an item")]
    NoItem,

    /// The provider was already consumed by an earlier `provide()` call.
    #[error("item provider already consumed; providers are single-use")]
    Consumed,

    /// The underlying graph rejected the run.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ProvideError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProvideError::Cancelled => "provide_cancelled",
            ProvideError::NoItem => "provide_no_item",
            ProvideError::Consumed => "provide_consumed",
            ProvideError::Graph(e) => e.as_label(),
        }
    }

    /// True if the run ended in user-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProvideError::Cancelled)
    }
}
