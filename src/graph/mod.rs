//! Task graph: dependency-ordered, one-shot execution.
//!
//! The only public types from this module are [`TaskGraph`] and [`NodeId`].
//! A graph is built per façade run, executed to completion once, and
//! discarded.

mod graph;

pub use graph::{NodeId, TaskGraph};
