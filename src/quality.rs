//! # Connection quality: coarse health signal for degradation messaging.
//!
//! [`QualityMonitor`] aggregates recent poll outcomes across all active
//! streams into a qualitative [`ConnectionQuality`] signal plus a
//! `graceful_degradation` flag. UI layers use the pair to decide between
//! serving stale data quietly and surfacing a hard error.
//!
//! ## Architecture
//! ```text
//! PollActor "orders" ──┐  record_success / record_failure
//! PollActor "queue"  ──┼────────► QualityMonitor
//! Registry           ──┘  register / deregister        │
//!                                                      ▼
//!                                    keys: HashMap<key, KeyHealth>
//!                                    window: VecDeque<OutcomeSample>
//! ```
//!
//! ## Mapping
//! The worst active stream governs:
//! - no active streams → `Unknown`
//! - ≥3 consecutive errors on any stream, or several streams with **every**
//!   one failing/stale → `Offline`
//! - 1–2 consecutive errors (a stale stream counts as one) → `Poor`
//! - zero errors, but a recent blip in the window or elevated latency
//!   → `Good`
//! - otherwise → `Excellent`
//!
//! ## Rules
//! - No persistence: quality is recomputed from in-memory state on every
//!   query.
//! - A stream that has not completed a cycle within its staleness deadline
//!   (`max interval × 2`) is treated as unhealthy — a heuristic signal only,
//!   never a cancellation trigger.
//! - `graceful_degradation` is true when quality is `Poor` or worse **and**
//!   at least one stream is still succeeding: partial failure, keep serving
//!   stale data quietly.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Qualitative connection health derived from recent poll outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionQuality {
    /// Zero recent errors, low latency.
    Excellent,
    /// Zero errors but elevated latency or a single recent blip.
    Good,
    /// 1–2 consecutive errors (or a stale stream) somewhere.
    Poor,
    /// ≥3 consecutive errors, or every one of several streams failing.
    Offline,
    /// No active streams to judge by.
    Unknown,
}

/// One recorded outcome in the sliding window.
#[derive(Clone, Copy, Debug)]
struct OutcomeSample {
    ok: bool,
    latency: Option<Duration>,
}

/// Per-stream health, updated by its actor each cycle.
#[derive(Clone, Debug)]
struct KeyHealth {
    consecutive_errors: u32,
    /// Last completed cycle (initialized to registration time).
    last_cycle: Instant,
    /// A cycle older than this counts the stream as stale.
    stale_after: Duration,
}

impl KeyHealth {
    fn is_stale(&self, now: Instant) -> bool {
        now.duration_since(self.last_cycle) > self.stale_after
    }
}

#[derive(Default)]
struct MonitorState {
    keys: HashMap<String, KeyHealth>,
    window: VecDeque<OutcomeSample>,
}

/// Aggregates per-stream outcomes into a [`ConnectionQuality`] signal.
///
/// Shared (`Arc`) between the registry, the actors, and the poller facade.
/// Interior mutability via `std::sync::RwLock` keeps the query side sync.
pub struct QualityMonitor {
    state: RwLock<MonitorState>,
    /// Sliding window size (last N outcomes across all streams).
    window_size: usize,
    /// Latency above this downgrades `Excellent` to `Good`.
    latency_threshold: Duration,
}

impl QualityMonitor {
    /// Creates a monitor with the given window size and latency threshold.
    pub fn new(window_size: usize, latency_threshold: Duration) -> Self {
        Self {
            state: RwLock::new(MonitorState::default()),
            window_size: window_size.max(1),
            latency_threshold,
        }
    }

    /// Registers a stream with its staleness deadline (typically the policy's
    /// `max × 2`). Re-registering a key resets its health.
    pub fn register(&self, key: &str, stale_after: Duration) {
        let mut state = self.write();
        state.keys.insert(
            key.to_string(),
            KeyHealth {
                consecutive_errors: 0,
                last_cycle: Instant::now(),
                stale_after,
            },
        );
    }

    /// Removes a stream; its history no longer influences the signal.
    pub fn deregister(&self, key: &str) {
        let mut state = self.write();
        state.keys.remove(key);
    }

    /// Records a successful cycle (fresh, unchanged, or 304) with its
    /// round-trip latency. Resets the stream's consecutive-error count.
    pub fn record_success(&self, key: &str, latency: Duration) {
        let mut state = self.write();
        if let Some(health) = state.keys.get_mut(key) {
            health.consecutive_errors = 0;
            health.last_cycle = Instant::now();
        }
        push_sample(
            &mut state,
            self.window_size,
            OutcomeSample {
                ok: true,
                latency: Some(latency),
            },
        );
    }

    /// Records a genuine failure. Increments the stream's consecutive-error
    /// count.
    pub fn record_failure(&self, key: &str) {
        let mut state = self.write();
        if let Some(health) = state.keys.get_mut(key) {
            health.consecutive_errors = health.consecutive_errors.saturating_add(1);
            health.last_cycle = Instant::now();
        }
        push_sample(
            &mut state,
            self.window_size,
            OutcomeSample {
                ok: false,
                latency: None,
            },
        );
    }

    /// Current quality, recomputed from in-memory state.
    pub fn quality(&self) -> ConnectionQuality {
        let state = self.read();
        let now = Instant::now();

        if state.keys.is_empty() {
            return ConnectionQuality::Unknown;
        }

        let mut worst: u32 = 0;
        let mut any_succeeding = false;
        for health in state.keys.values() {
            let effective = if health.is_stale(now) {
                health.consecutive_errors.max(1)
            } else {
                health.consecutive_errors
            };
            worst = worst.max(effective);
            if effective == 0 {
                any_succeeding = true;
            }
        }

        // Several streams all failing count as an outage even below the
        // three-error threshold; a single stream graduates through Poor.
        let total_outage = !any_succeeding && state.keys.len() > 1;
        match worst {
            0 => self.zero_error_quality(&state),
            1..=2 if !total_outage => ConnectionQuality::Poor,
            _ => ConnectionQuality::Offline,
        }
    }

    /// True when quality is `Poor` or worse but some stream still succeeds —
    /// the "serve stale data quietly" signal.
    pub fn graceful_degradation(&self) -> bool {
        let quality = self.quality();
        if !matches!(quality, ConnectionQuality::Poor | ConnectionQuality::Offline) {
            return false;
        }
        let state = self.read();
        let now = Instant::now();
        state
            .keys
            .values()
            .any(|h| h.consecutive_errors == 0 && !h.is_stale(now))
    }

    /// Zero consecutive errors everywhere: judge by window blips and latency.
    fn zero_error_quality(&self, state: &MonitorState) -> ConnectionQuality {
        let recent_blip = state.window.iter().any(|s| !s.ok);
        let elevated_latency = state
            .window
            .iter()
            .filter_map(|s| s.latency)
            .any(|l| l > self.latency_threshold);

        if recent_blip || elevated_latency {
            ConnectionQuality::Good
        } else {
            ConnectionQuality::Excellent
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MonitorState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MonitorState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn push_sample(state: &mut MonitorState, cap: usize, sample: OutcomeSample) {
    if state.window.len() == cap {
        state.window.pop_front();
    }
    state.window.push_back(sample);
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Duration = Duration::from_millis(50);

    fn monitor() -> QualityMonitor {
        QualityMonitor::new(16, Duration::from_millis(800))
    }

    #[test]
    fn test_no_streams_is_unknown() {
        assert_eq!(monitor().quality(), ConnectionQuality::Unknown);
    }

    #[test]
    fn test_healthy_stream_is_excellent() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.record_success("orders", FAST);
        m.record_success("orders", FAST);
        assert_eq!(m.quality(), ConnectionQuality::Excellent);
        assert!(!m.graceful_degradation());
    }

    #[test]
    fn test_elevated_latency_is_good() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.record_success("orders", Duration::from_secs(3));
        assert_eq!(m.quality(), ConnectionQuality::Good);
    }

    #[test]
    fn test_failure_streak_on_only_stream_graduates_to_offline() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.record_failure("orders");
        assert_eq!(m.quality(), ConnectionQuality::Poor);
        m.record_failure("orders");
        assert_eq!(m.quality(), ConnectionQuality::Poor);
        m.record_failure("orders");
        assert_eq!(m.quality(), ConnectionQuality::Offline);
        // Nothing succeeding: hard error, no graceful degradation.
        assert!(!m.graceful_degradation());
    }

    #[test]
    fn test_every_one_of_several_streams_failing_is_offline() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.register("queue-stats", Duration::from_secs(60));
        m.record_failure("orders");
        m.record_failure("queue-stats");
        assert_eq!(m.quality(), ConnectionQuality::Offline);
        assert!(!m.graceful_degradation());
    }

    #[test]
    fn test_success_after_failures_recovers_to_good_or_better() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        for _ in 0..3 {
            m.record_failure("orders");
        }
        m.record_success("orders", FAST);
        let q = m.quality();
        assert!(
            matches!(q, ConnectionQuality::Good | ConnectionQuality::Excellent),
            "expected good or better, got {q:?}"
        );
    }

    #[test]
    fn test_partial_failure_is_poor_with_graceful_degradation() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.register("queue-stats", Duration::from_secs(60));
        m.record_success("orders", FAST);
        m.record_failure("queue-stats");
        m.record_failure("queue-stats");

        assert_eq!(m.quality(), ConnectionQuality::Poor);
        assert!(m.graceful_degradation());
    }

    #[test]
    fn test_stale_stream_degrades_quality() {
        let m = monitor();
        // Deadline of zero: any elapsed time counts as stale.
        m.register("orders", Duration::ZERO);
        m.register("queue-stats", Duration::from_secs(60));
        m.record_success("queue-stats", FAST);
        assert_eq!(m.quality(), ConnectionQuality::Poor);
        assert!(m.graceful_degradation());
    }

    #[test]
    fn test_deregistered_stream_stops_counting() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.register("flaky", Duration::from_secs(60));
        m.record_success("orders", FAST);
        for _ in 0..5 {
            m.record_failure("flaky");
        }
        assert_eq!(m.quality(), ConnectionQuality::Offline);

        m.deregister("flaky");
        // Window still remembers blips, so Good rather than Excellent.
        assert_eq!(m.quality(), ConnectionQuality::Good);
    }

    #[test]
    fn test_reregistering_resets_health() {
        let m = monitor();
        m.register("orders", Duration::from_secs(60));
        m.record_failure("orders");
        m.register("orders", Duration::from_secs(60));
        let state = m.read();
        assert_eq!(state.keys["orders"].consecutive_errors, 0);
    }
}
