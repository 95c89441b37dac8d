//! # Engine configuration.
//!
//! Provides [`Config`], the settings bundle consumed by the façade and the
//! task-graph scheduler.
//!
//! Config is used in two ways:
//! 1. **Façade creation**: `ItemProvider::builder(..).with_config(cfg)`
//! 2. **Graph construction**: `TaskGraph::new(&cfg, bus)`
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no worker-pool semaphore created)
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use crate::provider::DialogMode;

/// Configuration for a façade run and its task graph.
///
/// ## Field semantics
/// - `max_concurrent`: worker-pool cap for the graph (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `dialog`: whether a progress dialog is wired into the graph at all
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of tasks running simultaneously on the graph's
    /// worker pool.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` tasks run at once
    ///
    /// Dependency ordering is enforced regardless of this cap.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,

    /// Whether the progress dialog lifecycle tasks are added to the graph.
    ///
    /// [`DialogMode::Disabled`] leaves the graph with the producer task and
    /// any background-window tasks only.
    pub dialog: DialogMode,
}

impl Config {
    /// Returns the worker-pool cap as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent tasks
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 256`
    /// - `dialog = DialogMode::Enabled`
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            bus_capacity: 256,
            dialog: DialogMode::Enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_concurrent_means_unlimited() {
        let cfg = Config {
            max_concurrent: 0,
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), None);

        let cfg = Config {
            max_concurrent: 3,
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(3));
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
