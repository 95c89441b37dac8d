//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   graph / producer ── publish(Event) ──► Bus ──► façade listener
//!                                                       │
//!                                                       ▼
//!                                              SubscriberSet::emit(&Event)
//!                                               ┌────────┴────────┐
//!                                               ▼                 ▼
//!                                          StateTracker      LogWriter / custom
//! ```
//!
//! ## Subscriber types
//! - **Passive** — observe and react (logging, an external progress display)
//! - **Stateful** — maintain state from events ([`StateTracker`])

mod set;
mod subscriber;
mod tracker;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
pub use tracker::StateTracker;
