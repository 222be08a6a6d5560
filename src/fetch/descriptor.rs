//! # Fetch descriptor: where and how to issue the GET.
//!
//! [`FetchDescriptor`] describes one poll stream's request: a target URL —
//! either a fixed string or a closure resolved once per cycle — plus static
//! headers. Headers typically carry whatever the hosting application needs
//! injected (auth tokens, CSRF headers); the core treats them as opaque.
//!
//! The descriptor is immutable for the stream's lifetime. Conditional-request
//! state ([`Validators`]) lives outside it and is updated opportunistically
//! by the scheduler from response headers.
//!
//! ## Example
//! ```rust
//! use pollvisor::FetchDescriptor;
//!
//! // Fixed endpoint:
//! let d = FetchDescriptor::url("https://api.example.test/orders")
//!     .with_header("x-csrf-token", "abc123");
//! assert_eq!(d.resolve(), "https://api.example.test/orders");
//!
//! // Recomputed every cycle:
//! let page = std::sync::atomic::AtomicU32::new(1);
//! let d = FetchDescriptor::url_with(move || {
//!     let p = page.load(std::sync::atomic::Ordering::Relaxed);
//!     format!("https://api.example.test/orders?page={p}")
//! });
//! assert_eq!(d.resolve(), "https://api.example.test/orders?page=1");
//! ```

use std::fmt;
use std::sync::Arc;

/// Target of a poll stream's GET request.
enum Target {
    /// Fixed URL, resolved once at registration.
    Static(String),
    /// Closure producing the URL, resolved once per cycle.
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

/// Request description for one poll stream.
///
/// Bundles the target URL variant with static headers. Cloneable so the
/// scheduler can hold its own copy for the stream's lifetime.
#[derive(Clone)]
pub struct FetchDescriptor {
    target: Arc<Target>,
    headers: Vec<(String, String)>,
}

impl FetchDescriptor {
    /// Creates a descriptor with a fixed URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            target: Arc::new(Target::Static(url.into())),
            headers: Vec::new(),
        }
    }

    /// Creates a descriptor whose URL is recomputed every cycle.
    pub fn url_with<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(Target::Dynamic(Arc::new(f))),
            headers: Vec::new(),
        }
    }

    /// Adds a static header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Resolves the URL for the current cycle.
    pub fn resolve(&self) -> String {
        match self.target.as_ref() {
            Target::Static(url) => url.clone(),
            Target::Dynamic(f) => f(),
        }
    }

    /// Static headers attached to every request.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl fmt::Debug for FetchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target.as_ref() {
            Target::Static(url) => f
                .debug_struct("FetchDescriptor")
                .field("url", url)
                .field("headers", &self.headers.len())
                .finish(),
            Target::Dynamic(_) => f
                .debug_struct("FetchDescriptor")
                .field("url", &"<dynamic>")
                .field("headers", &self.headers.len())
                .finish(),
        }
    }
}

/// Conditional-request state carried across cycles.
///
/// Sent as `If-None-Match` / `If-Modified-Since`; refreshed from `ETag` /
/// `Last-Modified` response headers when the server provides them. Servers
/// without validator support simply leave both slots empty and every
/// response is treated as fresh.
#[derive(Clone, Debug, Default)]
pub struct Validators {
    /// Last `ETag` seen for this stream.
    pub etag: Option<String>,
    /// Last `Last-Modified` seen for this stream.
    pub last_modified: Option<String>,
}

impl Validators {
    /// True when no validator has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// Merges validators from a fresh response, keeping prior values for
    /// slots the server did not resend.
    pub fn merge(&mut self, fresh: Validators) {
        if fresh.etag.is_some() {
            self.etag = fresh.etag;
        }
        if fresh.last_modified.is_some() {
            self.last_modified = fresh.last_modified;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_url_resolves_to_itself() {
        let d = FetchDescriptor::url("http://x.test/a");
        assert_eq!(d.resolve(), "http://x.test/a");
        assert_eq!(d.resolve(), "http://x.test/a");
    }

    #[test]
    fn test_dynamic_url_resolved_per_cycle() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let n = Arc::new(AtomicU32::new(0));
        let n2 = n.clone();
        let d = FetchDescriptor::url_with(move || {
            format!("http://x.test/{}", n2.fetch_add(1, Ordering::Relaxed))
        });
        assert_eq!(d.resolve(), "http://x.test/0");
        assert_eq!(d.resolve(), "http://x.test/1");
    }

    #[test]
    fn test_headers_accumulate() {
        let d = FetchDescriptor::url("http://x.test")
            .with_header("a", "1")
            .with_header("b", "2");
        assert_eq!(d.headers().len(), 2);
        assert_eq!(d.headers()[1], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn test_merge_keeps_prior_slots() {
        let mut v = Validators {
            etag: Some("\"e1\"".into()),
            last_modified: Some("Mon".into()),
        };
        v.merge(Validators {
            etag: Some("\"e2\"".into()),
            last_modified: None,
        });
        assert_eq!(v.etag.as_deref(), Some("\"e2\""));
        assert_eq!(v.last_modified.as_deref(), Some("Mon"));
    }

    #[test]
    fn test_empty_validators() {
        assert!(Validators::default().is_empty());
    }
}
