//! # PollActor: single-stream scheduler.
//!
//! Drives one poll stream through its lifecycle: fetch → classify → detect
//! change → notify → recompute delay → sleep → repeat. One sequential loop
//! per key, so responses for a key always apply in issuance order and at
//! most one request is in flight per key at any instant.
//!
//! ## Event flow
//! For each cycle, the actor publishes:
//! ```text
//! PollStarting → [fetch] → PollFresh      (material change, consumer notified)
//!                        → PollUnchanged  (304 or fingerprint match)
//!                        → PollFailed     (genuine error)
//!
//! If rescheduled:
//!   → CycleScheduled { delay, source } → [sleep] → (next cycle)
//! If the workload signal is terminal:
//!   → PollCompleted → exit (registry cleanup then removes the stream
//!                           and publishes PollRemoved)
//! ```
//!
//! ## Rules
//! - Cycles run **sequentially** within one actor (never parallel)
//! - Consecutive-error count **resets on any success** (including 304)
//! - Supersession/shutdown is **not** a failure: nothing recorded, no
//!   `on_error`, no backoff
//! - After the fetch resolves, the token is re-checked before any shared
//!   state is touched — a late result from a cancelled cycle is discarded

use std::sync::Arc;
use std::time::Instant;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::registry::ErrorTable;
use crate::error::ErrorInfo;
use crate::events::{Bus, Event, EventKind};
use crate::fetch::{Fetch, FetchOutcome, Validators};
use crate::quality::QualityMonitor;
use crate::streams::PollSpec;

/// Per-stream scheduler loop.
pub(crate) struct PollActor {
    spec: PollSpec,
    fetcher: Arc<dyn Fetch>,
    bus: Bus,
    quality: Arc<QualityMonitor>,
    errors: ErrorTable,
}

impl PollActor {
    /// Creates a new stream actor.
    pub(crate) fn new(
        spec: PollSpec,
        fetcher: Arc<dyn Fetch>,
        bus: Bus,
        quality: Arc<QualityMonitor>,
        errors: ErrorTable,
    ) -> Self {
        Self {
            spec,
            fetcher,
            bus,
            quality,
            errors,
        }
    }

    /// Runs the stream until cancellation or terminal completion.
    ///
    /// ### Exit conditions
    /// - `token` cancelled (stop, supersede, or runtime shutdown)
    /// - the workload signal reports [`Workload::Terminal`](crate::Workload)
    ///   and the interval calculator returns the no-reschedule sentinel
    ///
    /// ### Cancellation semantics
    /// - The token is raced against the fetch (aborting the transport) and
    ///   against the inter-cycle sleep.
    /// - A fetch result that arrives for a cancelled stream is discarded
    ///   before any snapshot/registry/monitor state is touched.
    pub(crate) async fn run(self, token: CancellationToken) {
        let key: Arc<str> = Arc::from(self.spec.key());
        let policy = self.spec.policy();
        let mut detector = self.spec.detector();
        let mut validators = Validators::default();
        let mut consecutive_errors: u32 = 0;
        let mut cycle: u64 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }

            cycle += 1;
            self.bus.publish(
                Event::new(EventKind::PollStarting)
                    .with_key(Arc::clone(&key))
                    .with_cycle(cycle),
            );

            let url = self.spec.descriptor().resolve();
            let started = Instant::now();
            let result = self
                .fetcher
                .fetch(
                    &url,
                    self.spec.descriptor().headers(),
                    &validators,
                    token.clone(),
                )
                .await;

            // Late resolution guard: a cancelled cycle's result is dropped
            // before it can reach the snapshot or the monitors.
            if token.is_cancelled() {
                break;
            }

            let mut last_failure: Option<String> = None;
            match result {
                Ok(FetchOutcome::Fresh {
                    data,
                    meta,
                    validators: fresh,
                }) => {
                    validators.merge(fresh);
                    consecutive_errors = 0;
                    self.quality.record_success(&key, started.elapsed());
                    self.errors.clear(&key);

                    match detector.accept(data) {
                        Some(snapshot) => {
                            self.bus.publish(
                                Event::new(EventKind::PollFresh)
                                    .with_key(Arc::clone(&key))
                                    .with_cycle(cycle)
                                    .with_latency(started.elapsed())
                                    .with_data(Arc::clone(&snapshot)),
                            );
                            self.spec.handler().on_update(snapshot, meta).await;
                        }
                        None => {
                            self.bus.publish(
                                Event::new(EventKind::PollUnchanged)
                                    .with_key(Arc::clone(&key))
                                    .with_cycle(cycle)
                                    .with_latency(started.elapsed()),
                            );
                        }
                    }
                }
                Ok(FetchOutcome::NotModified) => {
                    // Snapshot stands; consumer callback skipped.
                    consecutive_errors = 0;
                    self.quality.record_success(&key, started.elapsed());
                    self.errors.clear(&key);
                    self.bus.publish(
                        Event::new(EventKind::PollUnchanged)
                            .with_key(Arc::clone(&key))
                            .with_cycle(cycle)
                            .with_latency(started.elapsed()),
                    );
                }
                Err(err) if err.is_retryable() => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    self.quality.record_failure(&key);

                    let info = ErrorInfo::from_error(&err);
                    self.errors.record(&key, info.clone());
                    self.bus.publish(
                        Event::new(EventKind::PollFailed)
                            .with_key(Arc::clone(&key))
                            .with_cycle(cycle)
                            .with_reason(err.as_message()),
                    );
                    last_failure = Some(err.as_message());
                    self.spec.handler().on_error(&info).await;
                }
                // Superseded / Canceled: benign, nothing recorded.
                Err(_) => break,
            }

            let delay = match policy.next_delay(consecutive_errors, self.spec.workload()) {
                Some(delay) => delay,
                None => {
                    // Terminal: wind down instead of re-arming. Registry
                    // cleanup removes the stream once this loop returns.
                    self.bus.publish(
                        Event::new(EventKind::PollCompleted)
                            .with_key(Arc::clone(&key))
                            .with_cycle(cycle),
                    );
                    break;
                }
            };

            let mut scheduled = Event::new(EventKind::CycleScheduled)
                .with_key(Arc::clone(&key))
                .with_cycle(cycle)
                .with_delay(delay);
            scheduled = match last_failure {
                Some(reason) => scheduled.with_source_failure().with_reason(reason),
                None => scheduled.with_source_success(),
            };
            self.bus.publish(scheduled);

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => break,
            }
        }
    }
}
