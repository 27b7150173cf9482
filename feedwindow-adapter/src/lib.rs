//! Adapter utilities for the `feedwindow` crate.
//!
//! The `feedwindow` crate is UI-agnostic and focuses on the window/mode state machine. This crate
//! provides the framework-neutral pieces an adapter needs around it:
//!
//! - Listener binding for a scroll container (`EventBinder`)
//! - An async driver that runs continuations against a live query (`Controller`)
//! - An in-memory live query for tests and demos (`MemoryFeed`)
//!
//! This crate is intentionally framework-agnostic (no DOM/egui/ratatui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod binder;
mod controller;
mod error;
mod memory;
mod query;


pub use binder::{
    BindOutcome, EventBinder, ListenerOptions, ListenerTarget, ScrollContainer, ViewportEvent,
};
pub use controller::{Controller, LoadOutcome};
pub use error::Error;
pub use memory::{MemoryFeed, MemoryFeedError};
pub use query::LiveQuery;
