//! # pollvisor
//!
//! **Pollvisor** is an adaptive HTTP polling library for Rust.
//!
//! It provides primitives to register keyed poll streams against a REST
//! backend, schedule them with activity- and error-aware intervals, detect
//! material changes in the fetched payloads, and track connection health.
//! The crate is designed as the data-freshness engine behind dashboards and
//! order-tracking views that have no push channel.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   PollSpec   │   │   PollSpec   │   │   PollSpec   │
//!     │  ("orders")  │   │  ("queue")   │   │ ("order-42") │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Poller (composition root)                                        │
//! │  - Bus (broadcast events)                                         │
//! │  - QualityMonitor (per-key health, sliding window)                │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - Registry (manages active streams by key)                       │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  PollActor   │   │  PollActor   │   │  PollActor   │   │
//!     │ (poll loop)  │   │ (poll loop)  │   │ (poll loop)  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │                  │                  │                 │
//!      │ Publishes        │ Publishes        │ Publishes       │
//!      │ Events:          │ Events:          │ Events:         │
//!      │ - PollStarting   │ - PollStarting   │ - PollStarting  │
//!      │ - PollFresh      │ - PollFailed     │ - PollCompleted │
//!      │ - CycleScheduled │ - CycleScheduled │ - ...           │
//!      │                  │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                 (capacity: PollerConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │     (in Poller)        │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                    Bus::subscribe    SubscriberSet
//!                    (UI bindings)    (per-sub queues)
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                                  worker1  worker2  workerN
//!                                  ▼         ▼         ▼
//!                             sub1.on   sub2.on   subN.on
//!                              _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! PollSpec ──► Poller::start_polling ──► Registry ──► PollActor::run()
//!
//! loop {
//!   ├─► cycle += 1
//!   ├─► publish PollStarting{ key, cycle }
//!   ├─► GET via Fetch (conditional headers, cancellable)
//!   │       │
//!   │       ├─ Fresh ──► ChangeDetector::accept(payload)
//!   │       │            ├─ changed   ─► handler.on_update + PollFresh
//!   │       │            └─ unchanged ─► PollUnchanged (callback skipped)
//!   │       ├─ NotModified ─► PollUnchanged (snapshot stands)
//!   │       ├─ genuine Err ─► errors += 1, handler.on_error, PollFailed
//!   │       └─ Superseded  ─► exit (benign, nothing recorded)
//!   │
//!   ├─► delay = IntervalPolicy::next_delay(errors, workload())
//!   │       ├─ Some(d) ─► publish CycleScheduled{ delay }, sleep(d) (cancellable)
//!   │       └─ None    ─► publish PollCompleted, exit (terminal)
//!   │
//!   └─ exit conditions:
//!        - stream token cancelled (stop / supersede / shutdown)
//!        - workload signal reports Terminal
//! }
//!
//! On exit via stop/supersede/shutdown: registry joins the actor, clears the
//! last-error slot, deregisters from the quality monitor, publishes PollRemoved
//! ```
//!
//! ## Features
//! | Area               | Description                                                              | Key types / traits                           |
//! |--------------------|--------------------------------------------------------------------------|----------------------------------------------|
//! | **Streams**        | Define keyed poll streams: where to fetch, how often, who to notify.     | [`PollSpec`], [`PollHandler`], [`HandlerFn`] |
//! | **Scheduling**     | Activity- and error-aware intervals with exponential backoff and jitter. | [`IntervalPolicy`], [`Workload`], [`JitterPolicy`] |
//! | **Orchestration**  | Register, supersede, cancel, and tear down streams.                      | [`Poller`], [`PollGuard`]                    |
//! | **Transport**      | Conditional GETs with etag/last-modified revalidation.                   | [`Fetch`], [`HttpFetcher`], [`FetchDescriptor`] |
//! | **Change detection**| Fingerprint payloads; notify only on material change.                   | [`ChangeDetector`], [`ProjectFn`]            |
//! | **Health**         | Per-key health aggregated into an overall quality verdict.               | [`ConnectionQuality`], [`QualityMonitor`]    |
//! | **Subscriber API** | Hook into runtime events (logging, metrics, custom subscribers).         | [`Subscribe`], [`Event`], [`LogWriter`]      |
//! | **Errors**         | Typed errors for transport, decoding, and lifecycle.                     | [`PollError`], [`ErrorInfo`]                 |
//! | **Configuration**  | Centralize runtime settings.                                             | [`PollerConfig`]                             |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pollvisor::{
//!     FetchDescriptor, HandlerFn, LogWriter, PollSpec, Poller, PollerConfig, Workload,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = PollerConfig::default();
//!     cfg.timeout = Duration::from_secs(5);
//!
//!     let poller = Poller::builder(cfg)
//!         .with_subscriber(Arc::new(LogWriter))
//!         .build()?;
//!
//!     // Poll the order list; speed up when the kitchen queue is busy.
//!     let spec = PollSpec::with_defaults(
//!         "cashier-orders",
//!         FetchDescriptor::url("https://api.example.test/orders")
//!             .with_header("X-CSRF-Token", "..."),
//!         HandlerFn::arc(|data, _meta| async move {
//!             println!("orders changed: {data}");
//!         }),
//!         poller.config(),
//!     )
//!     .with_signal(|| Workload::Queue(4));
//!
//!     let guard = poller.start_polling(spec).await;
//!
//!     // ... the stream polls in the background; later:
//!     guard.cancel().await;
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod detect;
mod error;
mod events;
mod fetch;
mod policies;
mod quality;
mod streams;
mod subscribers;

// ---- Public re-exports ----

pub use config::PollerConfig;
pub use core::{PollGuard, Poller, PollerBuilder};
pub use detect::{id_status_projection, ChangeDetector, ProjectFn};
pub use error::{ErrorInfo, PollError};
pub use events::{Bus, CycleSource, Event, EventKind};
pub use fetch::{Fetch, FetchDescriptor, FetchOutcome, HttpFetcher, Validators};
pub use policies::{IntervalPolicy, JitterPolicy, Workload};
pub use quality::{ConnectionQuality, QualityMonitor};
pub use streams::{HandlerFn, HandlerRef, PollHandler, PollSpec, SignalFn};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
