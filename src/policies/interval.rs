//! # Adaptive interval policy.
//!
//! [`IntervalPolicy`] controls how the delay between poll cycles adapts to
//! failures and workload. It is parameterized by:
//! - [`IntervalPolicy::base`] the baseline delay between cycles;
//! - [`IntervalPolicy::min`] / [`IntervalPolicy::max`] the clamping bounds;
//! - [`IntervalPolicy::backoff_factor`] the multiplicative growth factor
//!   applied per consecutive error;
//! - [`IntervalPolicy::idle_cap`] the ceiling for the idle slow-down.
//!
//! With `n` consecutive errors the delay is `base × backoff_factor^n`,
//! clamped to `max` — exponential backoff with an uncapped growth rate but a
//! clamped ceiling. With zero errors the delay scales with the workload
//! signal instead: busy streams poll faster, idle streams poll slower.
//!
//! Every returned delay is clamped to `[min, max]` regardless of which
//! branch produced it.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{IntervalPolicy, Workload};
//!
//! let policy = IntervalPolicy {
//!     base: Duration::from_secs(5),
//!     max: Duration::from_secs(30),
//!     ..IntervalPolicy::default()
//! };
//!
//! // One error — base × 2^1 = 10s
//! assert_eq!(
//!     policy.next_delay(1, Workload::Queue(0)),
//!     Some(Duration::from_secs(10)),
//! );
//!
//! // Three errors — 5s × 2^3 = 40s → capped at max=30s
//! assert_eq!(
//!     policy.next_delay(3, Workload::Queue(0)),
//!     Some(Duration::from_secs(30)),
//! );
//!
//! // Terminal entity — do not reschedule
//! assert_eq!(policy.next_delay(0, Workload::Terminal), None);
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Per-cycle activity signal supplied by the consumer.
///
/// The scheduler queries the consumer's signal closure once per cycle and
/// feeds the result to [`IntervalPolicy::next_delay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// Current queue depth (pending orders, unread items, ...).
    ///
    /// - `0` — idle: slow the stream down to conserve resources
    /// - `1..=5` — moderate: keep the baseline interval
    /// - `>5` — busy: speed the stream up
    Queue(u32),

    /// The tracked entity reached a final state (e.g. an order was served or
    /// cancelled). The calculator returns the "do not reschedule" sentinel
    /// and the stream winds down instead of re-arming.
    Terminal,
}

impl Default for Workload {
    /// Returns `Workload::Queue(0)` (idle).
    fn default() -> Self {
        Workload::Queue(0)
    }
}

/// Adaptive poll interval policy.
///
/// Encapsulates the parameters that determine the delay before the next
/// cycle:
/// - [`IntervalPolicy::backoff_factor`] — growth factor per consecutive error;
/// - [`IntervalPolicy::base`] — the baseline delay;
/// - [`IntervalPolicy::min`] / [`IntervalPolicy::max`] — hard clamp bounds.
#[derive(Clone, Copy, Debug)]
pub struct IntervalPolicy {
    /// Baseline delay between cycles when the stream is healthy.
    pub base: Duration,
    /// Lower clamp bound for every computed delay.
    pub min: Duration,
    /// Upper clamp bound for every computed delay.
    pub max: Duration,
    /// Multiplicative growth factor per consecutive error (`>= 1.0`
    /// required for backoff to be monotonic).
    pub backoff_factor: f64,
    /// Ceiling for the idle slow-down (`base × 1.5` is capped here before
    /// the final clamp).
    pub idle_cap: Duration,
    /// Jitter applied to the final clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for IntervalPolicy {
    /// Returns a policy with:
    /// - `base = 5s`, `min = 1s`, `max = 30s`;
    /// - `backoff_factor = 2.0` (doubling);
    /// - `idle_cap = 30s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            min: Duration::from_secs(1),
            max: Duration::from_secs(30),
            backoff_factor: 2.0,
            idle_cap: Duration::from_secs(30),
            jitter: JitterPolicy::None,
        }
    }
}

impl IntervalPolicy {
    /// Computes the delay before the next cycle.
    ///
    /// Returns `None` — the "do not reschedule" sentinel — when the workload
    /// signal is [`Workload::Terminal`]; the scheduler then winds the stream
    /// down instead of arming a timer.
    ///
    /// Otherwise the base delay is derived as:
    /// - `consecutive_errors > 0` → `base × backoff_factor^errors`, with
    ///   non-finite/overflowing results clamped to `max`;
    /// - queue depth `0` → `min(base × 1.5, idle_cap)`;
    /// - queue depth `1..=5` → `base`;
    /// - queue depth `>5` → `base × 0.7` (floored at `min`).
    ///
    /// The result is clamped to `[min, max]`, then jitter is applied.
    ///
    /// # Notes
    /// - Deterministic and side-effect-free for `JitterPolicy::None`.
    /// - Backoff is monotonically non-decreasing in `consecutive_errors`
    ///   provided `backoff_factor >= 1.0`.
    pub fn next_delay(&self, consecutive_errors: u32, workload: Workload) -> Option<Duration> {
        if matches!(workload, Workload::Terminal) {
            return None;
        }

        let raw = if consecutive_errors > 0 {
            self.backoff_delay(consecutive_errors)
        } else {
            self.workload_delay(workload)
        };

        let clamped = raw.max(self.min).min(self.max);
        Some(self.jitter.apply(clamped))
    }

    /// Exponential backoff branch: `base × factor^errors`, capped at `max`.
    fn backoff_delay(&self, consecutive_errors: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = consecutive_errors.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.base.as_secs_f64() * self.backoff_factor.powi(exp);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped_secs)
        }
    }

    /// Healthy branch: scale the baseline by queue depth.
    fn workload_delay(&self, workload: Workload) -> Duration {
        let depth = match workload {
            Workload::Queue(n) => n,
            // Terminal is handled by the caller.
            Workload::Terminal => return self.base,
        };

        match depth {
            0 => self.base.mul_f64(1.5).min(self.idle_cap),
            1..=5 => self.base,
            _ => self.base.mul_f64(0.7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, min_ms: u64, max_ms: u64) -> IntervalPolicy {
        IntervalPolicy {
            base: Duration::from_millis(base_ms),
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
            backoff_factor: 2.0,
            idle_cap: Duration::from_millis(max_ms),
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_backoff_sequence_doubles_then_caps() {
        let p = policy(5_000, 1_000, 30_000);
        assert_eq!(
            p.next_delay(1, Workload::Queue(2)),
            Some(Duration::from_millis(10_000))
        );
        assert_eq!(
            p.next_delay(2, Workload::Queue(2)),
            Some(Duration::from_millis(20_000))
        );
        assert_eq!(
            p.next_delay(3, Workload::Queue(2)),
            Some(Duration::from_millis(30_000))
        );
        // Stays capped thereafter.
        assert_eq!(
            p.next_delay(4, Workload::Queue(2)),
            Some(Duration::from_millis(30_000))
        );
    }

    #[test]
    fn test_backoff_is_monotonic_and_bounded() {
        let p = policy(500, 100, 60_000);
        let mut prev = Duration::ZERO;
        for errors in 1..=32 {
            let d = p.next_delay(errors, Workload::Queue(0)).unwrap();
            assert!(d >= prev, "errors={errors}: {d:?} < {prev:?}");
            assert!(d <= p.max, "errors={errors}: {d:?} exceeds max");
            prev = d;
        }
    }

    #[test]
    fn test_huge_error_count_clamps_to_max() {
        let p = policy(100, 10, 10_000);
        assert_eq!(
            p.next_delay(u32::MAX, Workload::Queue(0)),
            Some(Duration::from_millis(10_000))
        );
    }

    #[test]
    fn test_success_resets_to_workload_based_interval() {
        let p = policy(5_000, 1_000, 30_000);
        // After an error streak the caller resets the counter to 0; the next
        // delay is back to workload scaling.
        assert_eq!(
            p.next_delay(0, Workload::Queue(3)),
            Some(Duration::from_millis(5_000))
        );
    }

    #[test]
    fn test_higher_workload_polls_equal_or_faster() {
        let p = policy(10_000, 1_000, 60_000);
        let idle = p.next_delay(0, Workload::Queue(0)).unwrap();
        let moderate = p.next_delay(0, Workload::Queue(3)).unwrap();
        let busy = p.next_delay(0, Workload::Queue(9)).unwrap();

        assert!(idle >= moderate, "{idle:?} < {moderate:?}");
        assert!(moderate >= busy, "{moderate:?} < {busy:?}");
        assert_eq!(idle, Duration::from_millis(15_000));
        assert_eq!(moderate, Duration::from_millis(10_000));
        assert_eq!(busy, Duration::from_millis(7_000));
    }

    #[test]
    fn test_workload_delays_stay_within_bounds() {
        let p = policy(1_000, 900, 1_200);
        for depth in [0u32, 1, 5, 6, 100] {
            let d = p.next_delay(0, Workload::Queue(depth)).unwrap();
            assert!(d >= p.min && d <= p.max, "depth={depth}: {d:?}");
        }
    }

    #[test]
    fn test_busy_delay_floors_at_min() {
        let p = policy(1_000, 950, 30_000);
        // base × 0.7 = 700ms, floored at min=950ms.
        assert_eq!(
            p.next_delay(0, Workload::Queue(10)),
            Some(Duration::from_millis(950))
        );
    }

    #[test]
    fn test_idle_delay_respects_idle_cap() {
        let mut p = policy(10_000, 1_000, 60_000);
        p.idle_cap = Duration::from_millis(12_000);
        // base × 1.5 = 15s, capped at idle_cap=12s.
        assert_eq!(
            p.next_delay(0, Workload::Queue(0)),
            Some(Duration::from_millis(12_000))
        );
    }

    #[test]
    fn test_terminal_returns_sentinel() {
        let p = policy(5_000, 1_000, 30_000);
        assert_eq!(p.next_delay(0, Workload::Terminal), None);
        // Terminal wins even mid-backoff.
        assert_eq!(p.next_delay(5, Workload::Terminal), None);
    }

    #[test]
    fn test_determinism_without_jitter() {
        let p = policy(5_000, 1_000, 30_000);
        for _ in 0..10 {
            assert_eq!(
                p.next_delay(2, Workload::Queue(1)),
                Some(Duration::from_millis(20_000))
            );
        }
    }
}
