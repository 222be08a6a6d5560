//! # Runtime events emitted by the registry and poll actors.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Cycle events**: poll execution flow (starting, fresh, unchanged, failed)
//! - **Management events**: stream lifecycle (added, removed, completed)
//! - **Subscriber events**: fan-out anomalies (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! poll key, delays, latencies, and — for fresh data — a shared handle to the
//! accepted payload. That payload handle is the `(key, data)` seam UI-layer
//! bindings consume instead of coupling to the scheduler.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::PollFailed)
//!     .with_key("cashier-orders")
//!     .with_reason("http status 503")
//!     .with_cycle(3);
//!
//! assert_eq!(ev.kind, EventKind::PollFailed);
//! assert_eq!(ev.key.as_deref(), Some("cashier-orders"));
//! assert_eq!(ev.reason.as_deref(), Some("http status 503"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Stream lifecycle events ===
    /// A poll stream was registered and its actor spawned.
    ///
    /// Sets:
    /// - `key`: poll key
    PollAdded,

    /// A poll stream was removed (cancelled, superseded, or completed).
    ///
    /// Sets:
    /// - `key`: poll key
    PollRemoved,

    /// The interval calculator returned the terminal sentinel; the stream
    /// will not reschedule.
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: last cycle number
    PollCompleted,

    // === Cycle events ===
    /// A poll cycle is starting (request about to be issued).
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: cycle number (1-based, per stream)
    PollStarting,

    /// A cycle fetched materially changed data; the consumer was notified.
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: cycle number
    /// - `latency_ms`: request round-trip time
    /// - `data`: shared handle to the accepted payload
    PollFresh,

    /// A cycle completed without a material change (304 or fingerprint
    /// match); the consumer callback was skipped.
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: cycle number
    /// - `latency_ms`: request round-trip time
    PollUnchanged,

    /// A cycle failed with a genuine error.
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: cycle number
    /// - `reason`: failure message
    PollFailed,

    /// Next cycle scheduled (after success or failure).
    ///
    /// Sets:
    /// - `key`: poll key
    /// - `cycle`: previous cycle number
    /// - `delay_ms`: delay before the next cycle (ms)
    /// - `source`: `Success` or `Failure`
    /// - `reason`: last failure message (only for failure-driven delays)
    CycleScheduled,
}

/// Whether the next cycle's delay was derived from a success or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSource {
    Success,
    Failure,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Poll key (or subscriber name for subscriber events).
    pub key: Option<Arc<str>>,
    /// Cycle count (starting from 1).
    pub cycle: Option<u64>,
    /// Delay before the next cycle in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Request round-trip time in milliseconds (compact).
    pub latency_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Source for cycle scheduling (success vs failure).
    pub source: Option<CycleSource>,
    /// Shared handle to the accepted payload (only for `PollFresh`).
    pub data: Option<Arc<Value>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            cycle: None,
            delay_ms: None,
            latency_ms: None,
            reason: None,
            source: None,
            data: None,
        }
    }

    /// Attaches a poll key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a cycle count.
    #[inline]
    pub fn with_cycle(mut self, n: u64) -> Self {
        self.cycle = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the delay before the next cycle (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches the request round-trip time (stored as milliseconds).
    #[inline]
    pub fn with_latency(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.latency_ms = Some(ms);
        self
    }

    /// Attaches a shared payload handle.
    #[inline]
    pub fn with_data(mut self, data: Arc<Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Marks that this schedule comes from a successful cycle.
    #[inline]
    pub fn with_source_success(mut self) -> Self {
        self.source = Some(CycleSource::Success);
        self
    }

    /// Marks that this schedule comes from a failed cycle.
    #[inline]
    pub fn with_source_failure(mut self) -> Self {
        self.source = Some(CycleSource::Failure);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::PollStarting);
        let b = Event::new(EventKind::PollStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::CycleScheduled)
            .with_key("orders")
            .with_cycle(7)
            .with_delay(Duration::from_millis(2500))
            .with_source_failure()
            .with_reason("boom");

        assert_eq!(ev.key.as_deref(), Some("orders"));
        assert_eq!(ev.cycle, Some(7));
        assert_eq!(ev.delay_ms, Some(2500));
        assert_eq!(ev.source, Some(CycleSource::Failure));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn test_delay_saturates_at_u32_max() {
        let ev = Event::new(EventKind::CycleScheduled)
            .with_delay(Duration::from_secs(u64::MAX / 1000));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
