//! # Jitter policy for poll delays.
//!
//! [`JitterPolicy`] adds randomness to computed delays to prevent thundering
//! herd effects when many streams (or many clients) poll the same backend on
//! synchronized schedules.
//!
//! - [`JitterPolicy::None`] — no randomization, predictable delays
//! - [`JitterPolicy::Full`] — random delay in [0, delay] (most aggressive)
//! - [`JitterPolicy::Equal`] — delay/2 + random[0, delay/2] (balanced)

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of poll delays.
///
/// Prevents synchronized request bursts across streams by adding controlled
/// randomness.
///
/// ## Trade-offs
/// - **None**: Predictable, but risks thundering herd
/// - **Full**: Maximum randomness, aggressive load spreading
/// - **Equal**: Balanced (preserves ~75% of the computed delay on average)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact computed delay.
    ///
    /// Use when:
    /// - Only one stream polls the endpoint (no herd risk)
    /// - Predictable timing required
    /// - Testing/debugging
    #[default]
    None,

    /// Full jitter: random delay in [0, delay].
    ///
    /// Most aggressive jitter, can significantly shorten a delay.
    /// Use when maximum load spreading is needed.
    Full,

    /// Equal jitter: delay = delay/2 + random[0, delay/2].
    ///
    /// Balances predictability with randomness.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => self.full_jitter(delay),
            JitterPolicy::Equal => self.equal_jitter(delay),
        }
    }

    /// Full jitter: random[0, delay]
    fn full_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::rng();
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.random_range(0..=ms))
    }

    /// Equal jitter: delay/2 + random[0, delay/2]
    fn equal_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::rng();
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let half = ms / 2;
        let jitter = if half == 0 {
            0
        } else {
            rng.random_range(0..=half)
        };
        Duration::from_millis(half + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn test_full_jitter_bounds() {
        let d = Duration::from_millis(1000);
        for _ in 0..50 {
            let out = JitterPolicy::Full.apply(d);
            assert!(out <= d);
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let d = Duration::from_millis(1000);
        for _ in 0..50 {
            let out = JitterPolicy::Equal.apply(d);
            assert!(out >= Duration::from_millis(500));
            assert!(out <= d);
        }
    }

    #[test]
    fn test_zero_delay_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
