//! # Stream registry: key → actor handle table with lifecycle control.
//!
//! The registry owns every live stream's `JoinHandle` and cancellation
//! token, enforces at-most-one actor per key, and centralizes per-key
//! last-error state for observability.
//!
//! ## Rules
//! - `start` on a live key is a legitimate **redefine**: the prior actor is
//!   cancelled and the replacement installed inside one map critical
//!   section, so concurrent redefines can never leave two live actors for a
//!   key (no error raised). The superseded actor is joined after the swap.
//! - `stop` is idempotent: stopping an absent key is a no-op.
//! - Generation counters make stale cancel guards inert: a guard from a
//!   superseded registration can no longer remove the key.
//! - The task map is mutated from `start`/`stop`/`cancel_all` call sites and
//!   from actor-exit cleanup on terminal completion; the latter is
//!   generation-checked, so it can never remove a key's replacement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::actor::PollActor;
use crate::error::ErrorInfo;
use crate::events::{Bus, Event, EventKind};
use crate::fetch::Fetch;
use crate::quality::QualityMonitor;
use crate::streams::PollSpec;

/// Handle to a running stream actor.
struct Handle {
    /// Join handle for the actor's execution.
    join: JoinHandle<()>,
    /// Individual cancellation token for this stream.
    cancel: CancellationToken,
    /// Registration generation, checked by cancel guards.
    generation: u64,
}

/// Per-key last-error table, shared between the registry and the actors.
///
/// Sync interior mutability so `last_error` stays a plain accessor.
#[derive(Clone, Default)]
pub(crate) struct ErrorTable {
    inner: Arc<std::sync::RwLock<HashMap<String, ErrorInfo>>>,
}

impl ErrorTable {
    pub(crate) fn record(&self, key: &str, info: ErrorInfo) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), info);
    }

    pub(crate) fn clear(&self, key: &str) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
    }

    pub(crate) fn get(&self, key: &str) -> Option<ErrorInfo> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }
}

/// Registry of active poll streams.
pub(crate) struct Registry {
    tasks: RwLock<HashMap<String, Handle>>,
    errors: ErrorTable,
    generations: AtomicU64,
    bus: Bus,
    quality: Arc<QualityMonitor>,
    fetcher: Arc<dyn Fetch>,
    runtime_token: CancellationToken,
}

impl Registry {
    /// Creates a new registry.
    pub(crate) fn new(
        bus: Bus,
        quality: Arc<QualityMonitor>,
        fetcher: Arc<dyn Fetch>,
        runtime_token: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            errors: ErrorTable::default(),
            generations: AtomicU64::new(0),
            bus,
            quality,
            fetcher,
            runtime_token,
        })
    }

    /// Registers a stream and immediately starts its actor.
    ///
    /// A live actor for the same key is superseded: cancelled and replaced
    /// within a single map critical section, then joined. Returns the
    /// registration generation for guard scoping.
    pub(crate) async fn start(self: &Arc<Self>, spec: PollSpec) -> u64 {
        let key = spec.key().to_string();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let stale_after = spec.policy().max.saturating_mul(2);

        let token = self.runtime_token.child_token();
        let actor = PollActor::new(
            spec,
            Arc::clone(&self.fetcher),
            self.bus.clone(),
            Arc::clone(&self.quality),
            self.errors.clone(),
        );
        let run = actor.run(token.clone());
        let registry = Arc::clone(self);
        let cleanup_key = key.clone();

        // Cancel-then-insert under one lock: a concurrent `start` for the
        // same key can never observe an empty slot mid-swap and spawn a
        // second live actor.
        let prev = {
            let mut tasks = self.tasks.write().await;
            let prev = tasks.remove(&key);
            if let Some(p) = &prev {
                p.cancel.cancel();
            }
            self.quality.register(&key, stale_after);
            self.errors.clear(&key);

            let join = tokio::spawn(async move {
                run.await;
                registry.remove_completed(&cleanup_key, generation).await;
            });
            tasks.insert(
                key.clone(),
                Handle {
                    join,
                    cancel: token,
                    generation,
                },
            );
            prev
        };

        // Join the superseded actor outside the lock: its exit cleanup takes
        // the same lock and would deadlock otherwise.
        if let Some(prev) = prev {
            let _ = prev.join.await;
            self.bus
                .publish(Event::new(EventKind::PollRemoved).with_key(&*key));
        }

        self.bus
            .publish(Event::new(EventKind::PollAdded).with_key(&*key));
        generation
    }

    /// Cancels and removes the stream if present; no-op when absent.
    pub(crate) async fn stop(&self, key: &str) {
        if let Some(handle) = self.take_handle(key).await {
            self.teardown(key, handle).await;
        }
    }

    /// Guard-scoped stop: removes the stream only when the generation still
    /// matches. A guard from a superseded registration becomes inert.
    pub(crate) async fn stop_generation(&self, key: &str, generation: u64) {
        let handle = {
            let mut tasks = self.tasks.write().await;
            match tasks.get(key) {
                Some(h) if h.generation == generation => tasks.remove(key),
                _ => None,
            }
        };
        if let Some(handle) = handle {
            self.teardown(key, handle).await;
        }
    }

    /// Last genuine failure recorded for the key, if any.
    pub(crate) fn last_error(&self, key: &str) -> Option<ErrorInfo> {
        self.errors.get(key)
    }

    /// Returns sorted list of registered stream keys.
    pub(crate) async fn list(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        let mut keys: Vec<String> = tasks.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Cancels all streams: cancel → join → `PollRemoved` per key.
    ///
    /// Used by `Poller::shutdown`; afterwards no timer is armed and no
    /// request is in flight.
    pub(crate) async fn cancel_all(&self) {
        let handles: Vec<(String, Handle)> = {
            let mut tasks = self.tasks.write().await;
            tasks.drain().collect()
        };

        for (_, h) in &handles {
            h.cancel.cancel();
        }
        for (key, h) in handles {
            let _ = h.join.await;
            self.quality.deregister(&key);
            self.errors.clear(&key);
            self.bus
                .publish(Event::new(EventKind::PollRemoved).with_key(&*key));
        }
    }

    /// Actor-exit cleanup: removes a terminally completed stream.
    ///
    /// Generation-checked, so a superseded or stopped actor can never remove
    /// the key's replacement; teardown paths drain the map before joining,
    /// which makes this a no-op for cancelled actors.
    async fn remove_completed(&self, key: &str, generation: u64) {
        let removed = {
            let mut tasks = self.tasks.write().await;
            match tasks.get(key) {
                Some(h) if h.generation == generation => tasks.remove(key).is_some(),
                _ => false,
            }
        };
        if removed {
            self.quality.deregister(key);
            self.errors.clear(key);
            self.bus
                .publish(Event::new(EventKind::PollRemoved).with_key(key));
        }
    }

    /// Atomically remove a handle from the table.
    async fn take_handle(&self, key: &str) -> Option<Handle> {
        let mut tasks = self.tasks.write().await;
        tasks.remove(key)
    }

    /// Cancel, join, and report removal of one stream.
    async fn teardown(&self, key: &str, handle: Handle) {
        handle.cancel.cancel();
        let _ = handle.join.await;
        self.quality.deregister(key);
        self.errors.clear(key);
        self.bus
            .publish(Event::new(EventKind::PollRemoved).with_key(key));
    }
}
