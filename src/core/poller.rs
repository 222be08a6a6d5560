//! # Poller: composition root for the polling runtime.
//!
//! The [`Poller`] owns the event bus, the stream [`Registry`], the
//! [`QualityMonitor`], the transport ([`Fetch`] implementation), and a
//! [`SubscriberSet`] for observability fan-out. It is an explicit,
//! constructor-injected object — tests and applications instantiate
//! isolated pollers; there is no hidden process-wide singleton.
//!
//! ## High-level architecture
//! ```text
//! Inputs:
//!   PollSpec ──► Poller::start_polling ──► Registry ──► PollActor (per key)
//!
//! Event flow:
//!   PollActor ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                      └──► Bus::subscribe receivers (UI bindings)
//!
//! Health flow:
//!   PollActor ── record_success/record_failure ──► QualityMonitor
//!   Poller::connection_quality() ◄── recomputed on demand
//!
//! Teardown:
//!   Poller::shutdown() ──► runtime_token.cancel()
//!                     ──► Registry::cancel_all(): cancel → join per stream
//!                          (every timer cleared, every request aborted)
//! ```
//!
//! ## Example
//! ```no_run
//! use pollvisor::{FetchDescriptor, HandlerFn, PollSpec, Poller, PollerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let poller = Poller::builder(PollerConfig::default()).build()?;
//!
//!     let spec = PollSpec::with_defaults(
//!         "cashier-orders",
//!         FetchDescriptor::url("https://api.example.test/orders"),
//!         HandlerFn::arc(|data, _meta| async move {
//!             println!("orders changed: {data}");
//!         }),
//!         poller.config(),
//!     );
//!
//!     let guard = poller.start_polling(spec).await;
//!     // ... later:
//!     guard.cancel().await;
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::core::registry::Registry;
use crate::error::{ErrorInfo, PollError};
use crate::events::{Bus, Event};
use crate::fetch::{Fetch, HttpFetcher};
use crate::quality::{ConnectionQuality, QualityMonitor};
use crate::streams::PollSpec;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Coordinates poll streams, event delivery, and teardown.
pub struct Poller {
    cfg: PollerConfig,
    bus: Bus,
    registry: Arc<Registry>,
    quality: Arc<QualityMonitor>,
    /// Taken (and drained) by `shutdown`.
    subs: Arc<Mutex<Option<SubscriberSet>>>,
    runtime_token: CancellationToken,
}

/// Builder for constructing a [`Poller`] with optional features.
pub struct PollerBuilder {
    cfg: PollerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    fetcher: Option<Arc<dyn Fetch>>,
}

impl PollerBuilder {
    /// Adds one subscriber to the fan-out set.
    pub fn with_subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Adds several subscribers to the fan-out set.
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subs);
        self
    }

    /// Overrides the transport. Tests inject scripted fetchers here;
    /// applications normally keep the default [`HttpFetcher`].
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Builds the poller, constructing the default HTTP transport when none
    /// was injected.
    pub fn build(self) -> Result<Poller, PollError> {
        let fetcher = match self.fetcher {
            Some(f) => f,
            None => Arc::new(HttpFetcher::new(&self.cfg)?),
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let quality = Arc::new(QualityMonitor::new(
            self.cfg.quality_window,
            self.cfg.latency_threshold,
        ));
        let runtime_token = CancellationToken::new();
        let registry = Registry::new(
            bus.clone(),
            Arc::clone(&quality),
            fetcher,
            runtime_token.clone(),
        );
        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let has_subscribers = !set.is_empty();
        let subs = Arc::new(Mutex::new(Some(set)));

        let poller = Poller {
            cfg: self.cfg,
            bus,
            registry,
            quality,
            subs,
            runtime_token,
        };
        if has_subscribers {
            poller.subscriber_listener();
        }
        Ok(poller)
    }
}

impl Poller {
    /// Starts building a poller with the given configuration.
    pub fn builder(cfg: PollerConfig) -> PollerBuilder {
        PollerBuilder {
            cfg,
            subscribers: Vec::new(),
            fetcher: None,
        }
    }

    /// The runtime configuration (for `PollSpec::with_defaults`).
    pub fn config(&self) -> &PollerConfig {
        &self.cfg
    }

    /// Registers a stream and immediately starts polling it.
    ///
    /// Starting a key that is already live **supersedes** the previous
    /// stream: its timer is cleared and any in-flight request aborted before
    /// the replacement spawns. Returns a guard whose `cancel()` is
    /// idempotent and scoped to this registration.
    pub async fn start_polling(&self, spec: PollSpec) -> PollGuard {
        let key = spec.key().to_string();
        let generation = self.registry.start(spec).await;
        PollGuard {
            key,
            generation,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Cancels and removes the stream if present; no-op when absent.
    pub async fn stop_polling(&self, key: &str) {
        self.registry.stop(key).await;
    }

    /// Last genuine failure recorded for the key, if any.
    ///
    /// Cleared by the next successful cycle and by stream removal.
    pub fn last_error(&self, key: &str) -> Option<ErrorInfo> {
        self.registry.last_error(key)
    }

    /// Current connection quality across all active streams.
    pub fn connection_quality(&self) -> ConnectionQuality {
        self.quality.quality()
    }

    /// True when quality is degraded but some stream still succeeds — the
    /// "serve stale data quietly" signal.
    pub fn graceful_degradation(&self) -> bool {
        self.quality.graceful_degradation()
    }

    /// Sorted keys of currently registered streams.
    pub async fn active_keys(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// Creates an independent receiver for runtime events — the `(key,
    /// data)` seam UI-layer bindings consume.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Cancels every stream, aborts all in-flight requests, and drains the
    /// subscriber set.
    ///
    /// After this resolves, no timer is armed, no request is in flight, and
    /// every event already queued for a subscriber has been processed; the
    /// poller must not be reused for new streams afterwards.
    pub async fn shutdown(&self) {
        self.registry.cancel_all().await;
        self.runtime_token.cancel();
        if let Some(set) = self.subs.lock().await.take() {
            set.shutdown().await;
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget), until shutdown.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let token = self.runtime_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => match subs.lock().await.as_ref() {
                            Some(set) => set.emit(&ev),
                            None => break,
                        },
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
            }
        });
    }
}

/// Cancel handle for one stream registration.
///
/// `cancel()` is idempotent and **generation-scoped**: once the key has been
/// superseded by a newer `start_polling`, this guard becomes inert and
/// cannot remove the replacement stream.
pub struct PollGuard {
    key: String,
    generation: u64,
    registry: Arc<Registry>,
}

impl PollGuard {
    /// The stream key this guard controls.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cancels the stream this guard was issued for. Safe to call multiple
    /// times; a no-op once the stream is gone or superseded.
    pub async fn cancel(&self) {
        self.registry.stop_generation(&self.key, self.generation).await;
    }
}
