//! Runtime core: stream orchestration and lifecycle.
//!
//! This module contains the embedded implementation of the polling runtime.
//! The public API from this module is [`Poller`] (plus its builder and the
//! [`PollGuard`] cancel handle); it owns stream registration, per-key
//! scheduling, and teardown.
//!
//! ## Wiring
//! ```text
//! PollSpec ──► Poller::start_polling ──► Registry ──► PollActor::run()
//!
//! loop {
//!   ├─► cycle += 1, publish PollStarting
//!   ├─► resolve descriptor, GET via Fetch (cancellable)
//!   │       │
//!   │       ├─ Fresh        ─► ChangeDetector ─► changed?  on_update + PollFresh
//!   │       │                                   unchanged? PollUnchanged
//!   │       ├─ NotModified  ─► PollUnchanged (snapshot stands)
//!   │       ├─ genuine Err  ─► errors += 1, on_error, PollFailed
//!   │       └─ Superseded   ─► exit (benign, nothing recorded)
//!   │
//!   ├─► delay = IntervalPolicy::next_delay(errors, workload())
//!   │       ├─ Some(d) ─► publish CycleScheduled, cancellable sleep(d)
//!   │       └─ None    ─► publish PollCompleted, exit (terminal; exit
//!   │                     cleanup removes the stream, publishes PollRemoved)
//!   └─ exit conditions:
//!        - stream token cancelled (stop_polling / supersede / shutdown)
//!        - terminal workload signal
//! }
//! ```
//!
//! Internal modules:
//! - [`registry`]: key → handle table, supersession, last-error state;
//! - [`actor`]: the per-key scheduling loop;
//! - [`poller`]: composition root, builder, cancel guard.

mod actor;
mod poller;
mod registry;

pub use poller::{PollGuard, Poller, PollerBuilder};
