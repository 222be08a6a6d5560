//! # Global runtime configuration.
//!
//! Provides [`PollerConfig`] centralized settings for the polling runtime.
//!
//! Config is used in two ways:
//! 1. **Poller creation**: `Poller::builder(config)`
//! 2. **PollSpec defaults**: `PollSpec::with_defaults(key, descriptor, handler, &config)`
//!
//! ## Sentinel values
//! - `timeout = 0s` → no explicit request timeout (rely on the transport's
//!   own defaults)

use std::time::Duration;

use crate::policies::IntervalPolicy;

/// Global configuration for the polling runtime.
///
/// Defines:
/// - **Event system**: bus capacity for event delivery
/// - **Transport**: request timeout and user agent for the HTTP client
/// - **Stream defaults**: interval policy inherited by `PollSpec::with_defaults`
/// - **Quality monitor**: window size and latency threshold
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `timeout`: Per-request HTTP timeout (`0s` = transport default)
/// - `user_agent`: User-Agent header for every request
/// - `default_policy`: Default interval policy (can be overridden per-stream)
/// - `quality_window`: Number of recent outcomes the quality monitor keeps
/// - `latency_threshold`: Round-trip above this counts as elevated latency
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to
/// avoid sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1
    /// (enforced by Bus).
    pub bus_capacity: usize,

    /// Per-request HTTP timeout.
    ///
    /// - `Duration::ZERO` = no explicit timeout (transport default)
    /// - `> 0` = applied to every request the fetcher issues
    pub timeout: Duration,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Default interval policy for streams.
    ///
    /// Used by `PollSpec::with_defaults()`. Can be overridden per-stream.
    pub default_policy: IntervalPolicy,

    /// Number of recent outcomes the quality monitor keeps in its sliding
    /// window.
    pub quality_window: usize,

    /// Round-trip latency above this downgrades quality from `Excellent` to
    /// `Good`.
    pub latency_threshold: Duration,
}

impl PollerConfig {
    /// Returns the per-request timeout as an `Option`.
    ///
    /// - `None` → rely on the transport's defaults
    /// - `Some(d)` → timeout applied per request
    #[inline]
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PollerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `timeout = 10s`
    /// - `user_agent = "pollvisor/<version>"`
    /// - `default_policy = IntervalPolicy::default()` (5s base, doubling backoff)
    /// - `quality_window = 16`
    /// - `latency_threshold = 1s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            timeout: Duration::from_secs(10),
            user_agent: concat!("pollvisor/", env!("CARGO_PKG_VERSION")).to_string(),
            default_policy: IntervalPolicy::default(),
            quality_window: 16,
            latency_threshold: Duration::from_secs(1),
        }
    }
}
