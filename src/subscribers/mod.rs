//! # Event subscribers for the polling runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`LogWriter`] for handling runtime events
//! broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   PollActor ── publish(Event) ──► Bus ──► subscriber listener
//!                                              │
//!                                              ▼
//!                                       SubscriberSet::emit
//!                                              │
//!                                   ┌──────────┼──────────┐
//!                                   ▼          ▼          ▼
//!                              [queue S1] [queue S2] [queue SN]
//!                                   │          │          │
//!                               worker S1  worker S2  worker SN
//!                                   ▼          ▼          ▼
//!                               on_event   on_event   on_event
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use pollvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::PollFailed {
//!             // increment failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "failure-counter"
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
