//! # Poll stream specification.
//!
//! Defines [`PollSpec`] — a configuration bundle describing one poll stream:
//! its key, where to fetch ([`FetchDescriptor`]), how to schedule
//! ([`IntervalPolicy`] + workload signal), how to fingerprint payloads, and
//! who to notify ([`HandlerRef`]).
//!
//! A spec can be created:
//! - **Explicitly** with [`PollSpec::new`] (full control)
//! - **From config** with [`PollSpec::with_defaults`] (inherit the poller's
//!   default interval policy)
//!
//! ## Rules
//! - The spec is passed to `Poller::start_polling` for execution; starting a
//!   key that is already live supersedes the previous stream.

use std::sync::Arc;

use crate::config::PollerConfig;
use crate::detect::{ChangeDetector, ProjectFn};
use crate::fetch::FetchDescriptor;
use crate::policies::{IntervalPolicy, Workload};
use crate::streams::handler::HandlerRef;

/// Per-cycle workload probe supplied by the consumer.
///
/// Queried once per cycle; returning [`Workload::Terminal`] winds the stream
/// down (the tracked entity reached a final state).
pub type SignalFn = Arc<dyn Fn() -> Workload + Send + Sync>;

/// Specification for one poll stream.
///
/// Bundles together:
/// - The stream key (unique per active stream)
/// - The fetch descriptor ([`FetchDescriptor`])
/// - The interval policy ([`IntervalPolicy`]) and optional workload signal
/// - An optional fingerprint projection for change detection
/// - The consumer handler ([`HandlerRef`])
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use pollvisor::{FetchDescriptor, HandlerFn, IntervalPolicy, PollSpec, Workload};
///
/// let spec = PollSpec::new(
///     "cashier-orders",
///     FetchDescriptor::url("https://api.example.test/orders"),
///     IntervalPolicy {
///         base: Duration::from_secs(5),
///         ..IntervalPolicy::default()
///     },
///     HandlerFn::arc(|data, _meta| async move {
///         let _ = data; // refresh dashboard
///     }),
/// )
/// .with_signal(|| Workload::Queue(3));
///
/// assert_eq!(spec.key(), "cashier-orders");
/// ```
#[derive(Clone)]
pub struct PollSpec {
    key: String,
    descriptor: FetchDescriptor,
    policy: IntervalPolicy,
    signal: Option<SignalFn>,
    projection: Option<ProjectFn>,
    handler: HandlerRef,
}

impl PollSpec {
    /// Creates a new stream specification with explicit parameters.
    ///
    /// ### Parameters
    /// - `key`: Unique stream identifier (e.g. `"cashier-orders"`)
    /// - `descriptor`: Where and how to issue the GET
    /// - `policy`: Interval/backoff configuration
    /// - `handler`: Consumer callbacks
    pub fn new(
        key: impl Into<String>,
        descriptor: FetchDescriptor,
        policy: IntervalPolicy,
        handler: HandlerRef,
    ) -> Self {
        Self {
            key: key.into(),
            descriptor,
            policy,
            signal: None,
            projection: None,
            handler,
        }
    }

    /// Creates a specification inheriting the poller's default interval
    /// policy.
    pub fn with_defaults(
        key: impl Into<String>,
        descriptor: FetchDescriptor,
        handler: HandlerRef,
        cfg: &PollerConfig,
    ) -> Self {
        Self::new(key, descriptor, cfg.default_policy, handler)
    }

    /// Attaches a workload signal probe.
    ///
    /// Without one, every cycle is treated as moderate workload
    /// (`Workload::Queue(1)`): the baseline interval, no idle slow-down, no
    /// terminal wind-down.
    pub fn with_signal<F>(mut self, signal: F) -> Self
    where
        F: Fn() -> Workload + Send + Sync + 'static,
    {
        self.signal = Some(Arc::new(signal));
        self
    }

    /// Overrides the change-detection fingerprint projection.
    ///
    /// Defaults to the id+status heuristic (see
    /// [`id_status_projection`](crate::id_status_projection)).
    pub fn with_projection(mut self, projection: ProjectFn) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Returns a new spec with an updated interval policy.
    pub fn with_policy(mut self, policy: IntervalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the stream key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the fetch descriptor.
    pub fn descriptor(&self) -> &FetchDescriptor {
        &self.descriptor
    }

    /// Returns the interval policy.
    pub fn policy(&self) -> IntervalPolicy {
        self.policy
    }

    /// Returns the consumer handler.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Samples the workload signal for the current cycle.
    pub(crate) fn workload(&self) -> Workload {
        match &self.signal {
            Some(f) => f(),
            None => Workload::Queue(1),
        }
    }

    /// Builds the stream's change detector.
    pub(crate) fn detector(&self) -> ChangeDetector {
        match &self.projection {
            Some(p) => ChangeDetector::with_projection(Arc::clone(p)),
            None => ChangeDetector::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::HandlerFn;
    use std::time::Duration;

    fn handler() -> HandlerRef {
        HandlerFn::arc(|_data, _meta| async {})
    }

    #[test]
    fn test_defaults_inherit_config_policy() {
        let mut cfg = PollerConfig::default();
        cfg.default_policy.base = Duration::from_secs(9);

        let spec = PollSpec::with_defaults(
            "k",
            FetchDescriptor::url("http://x.test"),
            handler(),
            &cfg,
        );
        assert_eq!(spec.policy().base, Duration::from_secs(9));
    }

    #[test]
    fn test_missing_signal_defaults_to_moderate() {
        let spec = PollSpec::new(
            "k",
            FetchDescriptor::url("http://x.test"),
            IntervalPolicy::default(),
            handler(),
        );
        assert_eq!(spec.workload(), Workload::Queue(1));
    }

    #[test]
    fn test_signal_is_sampled() {
        let spec = PollSpec::new(
            "k",
            FetchDescriptor::url("http://x.test"),
            IntervalPolicy::default(),
            handler(),
        )
        .with_signal(|| Workload::Terminal);
        assert_eq!(spec.workload(), Workload::Terminal);
    }
}
