//! HTTP fetch adapter: one GET per poll cycle.
//!
//! This module provides the transport seam between the scheduler and the
//! REST backend:
//! - [`FetchDescriptor`] — where to fetch (static URL or per-cycle closure)
//!   plus static headers supplied by the host (auth/CSRF, opaque to the core)
//! - [`Validators`] — conditional-request state (etag / last-modified)
//!   carried across cycles
//! - [`FetchOutcome`] — classified result: fresh payload or not-modified
//! - [`Fetch`] — the async transport trait (stubbed in tests)
//! - [`HttpFetcher`] — the reqwest-backed implementation

mod descriptor;
mod http;

pub use descriptor::{FetchDescriptor, Validators};
pub use http::{Fetch, FetchOutcome, HttpFetcher};
