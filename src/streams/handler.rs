//! # Handler contract and closure-backed implementation.
//!
//! This module defines the [`PollHandler`] trait — the consumer side of a
//! poll stream — and a convenient closure-backed implementation
//! [`HandlerFn`]. The common handle type is [`HandlerRef`], an
//! `Arc<dyn PollHandler>` suitable for sharing across the runtime.
//!
//! ## Contract
//! - `on_update` fires only when the change detector reports a material
//!   change; unchanged cycles and `304 Not Modified` responses are silent.
//! - `on_error` fires only for genuine failures; supersession and shutdown
//!   never reach it.
//! - Handlers run inside the stream's own actor loop — a slow handler delays
//!   that stream's next cycle but never another stream's.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ErrorInfo;

/// Shared handle to a poll handler.
pub type HandlerRef = Arc<dyn PollHandler>;

/// # Consumer callbacks for one poll stream.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use pollvisor::{ErrorInfo, PollHandler};
///
/// struct OrderBoard;
///
/// #[async_trait]
/// impl PollHandler for OrderBoard {
///     async fn on_update(&self, data: Arc<Value>, _meta: Option<Value>) {
///         // re-render the board from `data`...
///         let _ = data;
///     }
///
///     async fn on_error(&self, error: &ErrorInfo) {
///         eprintln!("orders poll failed: {}", error.message);
///     }
/// }
/// ```
#[async_trait]
pub trait PollHandler: Send + Sync + 'static {
    /// Receives a materially changed payload and its envelope `meta`.
    ///
    /// The payload handle is shared with the stream's snapshot; treat it as
    /// immutable.
    async fn on_update(&self, data: Arc<Value>, meta: Option<Value>);

    /// Receives genuine failures (network, HTTP, decode, rejection).
    ///
    /// Default implementation ignores them — backoff and quality tracking
    /// happen regardless.
    async fn on_error(&self, error: &ErrorInfo) {
        let _ = error;
    }
}

/// Closure-backed handler implementation.
///
/// Wraps an update closure; errors fall through to the default no-op.
///
/// ## Example
/// ```rust
/// use pollvisor::{HandlerFn, HandlerRef};
///
/// let h: HandlerRef = HandlerFn::arc(|data, _meta| async move {
///     println!("orders changed: {data}");
/// });
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new closure-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(Arc<Value>, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> PollHandler for HandlerFn<F>
where
    F: Fn(Arc<Value>, Option<Value>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_update(&self, data: Arc<Value>, meta: Option<Value>) {
        (self.f)(data, meta).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_handler_fn_forwards_updates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let h: HandlerRef = HandlerFn::arc(move |data, meta| {
            let calls = calls2.clone();
            async move {
                assert_eq!(*data, json!([1, 2]));
                assert!(meta.is_none());
                calls.fetch_add(1, Ordering::Relaxed);
            }
        });

        h.on_update(Arc::new(json!([1, 2])), None).await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_default_on_error_is_noop() {
        let h: HandlerRef = HandlerFn::arc(|_data, _meta| async {});
        let info = ErrorInfo::from_error(&crate::PollError::Http { status: 500 });
        // Must not panic.
        h.on_error(&info).await;
    }
}
