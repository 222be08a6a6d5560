//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the registry and the
//! per-key poll actors.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry`, `PollActor`, `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: `Poller`'s subscriber listener (fans out to
//!   `SubscriberSet`) and any UI-layer binding holding a
//!   [`Bus::subscribe`] receiver.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{CycleSource, Event, EventKind};
