//! In-process change feed for the pin/photo graph.
//!
//! The presentation layer subscribes to [`ChangeBus`] instead of receiving
//! persistence-controller callbacks: per-photo row changes and per-pin
//! fetch-state transitions all flow through it.

pub mod bus;

pub use bus::{ChangeBus, ChangeEvent};
