//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the task graph, the producer task
//! and the façade.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskGraph` (ready/starting/finished), `ProducerTask`
//!   (cancel-requested, progress), `ItemProvider` (graph-completed/cancelled),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the façade's subscriber listener, which fans events out
//!   to the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
