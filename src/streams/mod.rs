//! # Poll stream abstractions and specifications.
//!
//! This module provides the consumer-facing stream types:
//! - [`PollHandler`] - trait receiving materially changed data and genuine errors
//! - [`HandlerFn`] - closure-based handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn PollHandler>`)
//! - [`PollSpec`] - specification bundling key, descriptor, policy, and handler

mod handler;
mod spec;

pub use handler::{HandlerFn, HandlerRef, PollHandler};
pub use spec::{PollSpec, SignalFn};
