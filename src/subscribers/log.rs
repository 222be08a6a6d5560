//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] emits one `tracing` record per event in a compact,
//! human-readable format. Primarily useful for development, debugging, and
//! examples.
//!
//! ## Output shape
//! ```text
//! DEBUG poll starting key=orders cycle=3
//! INFO  poll fresh key=orders cycle=3 latency_ms=120
//! WARN  poll failed key=orders cycle=4 reason="http status 503"
//! DEBUG cycle scheduled key=orders delay_ms=10000 source=Failure
//! INFO  poll completed key=order-tracking-42 cycle=9
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Logging subscriber backed by `tracing`.
///
/// Not intended as the observability story for applications – implement a
/// custom [`Subscribe`] for structured metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::PollAdded => {
                tracing::info!(key, "poll added");
            }
            EventKind::PollRemoved => {
                tracing::info!(key, "poll removed");
            }
            EventKind::PollCompleted => {
                tracing::info!(key, cycle = e.cycle, "poll completed");
            }
            EventKind::PollStarting => {
                tracing::debug!(key, cycle = e.cycle, "poll starting");
            }
            EventKind::PollFresh => {
                tracing::info!(key, cycle = e.cycle, latency_ms = e.latency_ms, "poll fresh");
            }
            EventKind::PollUnchanged => {
                tracing::debug!(
                    key,
                    cycle = e.cycle,
                    latency_ms = e.latency_ms,
                    "poll unchanged"
                );
            }
            EventKind::PollFailed => {
                tracing::warn!(
                    key,
                    cycle = e.cycle,
                    reason = e.reason.as_deref(),
                    "poll failed"
                );
            }
            EventKind::CycleScheduled => {
                tracing::debug!(
                    key,
                    cycle = e.cycle,
                    delay_ms = e.delay_ms,
                    source = ?e.source,
                    "cycle scheduled"
                );
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(subscriber = key, reason = e.reason.as_deref(), "subscriber anomaly");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
