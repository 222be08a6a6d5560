//! Error types used by the polling runtime.
//!
//! This module defines:
//!
//! - [`PollError`] — errors raised by a single poll cycle (transport, HTTP,
//!   decoding, envelope rejection, cancellation).
//! - [`ErrorInfo`] — the consumer-facing record stored per key and handed to
//!   `on_error` callbacks.
//!
//! [`PollError`] provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and [`PollError::is_retryable`] to separate genuine
//! failures from benign cancellations.
//!
//! ## Rules
//! - Nothing here is fatal to the process: a perpetually failing key keeps
//!   polling at its maximum interval until cancelled.
//! - [`PollError::Superseded`] and [`PollError::Canceled`] never increment
//!   error counters and are never surfaced through `on_error`.

use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

/// # Errors produced by a single poll cycle.
///
/// Genuine failures (`Network`, `Http`, `Decode`, `Rejected`) feed the
/// backoff calculator and the connection-quality monitor. Benign
/// cancellations (`Superseded`, `Canceled`) are silently dropped.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum PollError {
    /// Transport-level failure (connection refused, timeout, DNS, ...).
    #[error("network failure: {message}")]
    Network {
        /// The underlying transport error message.
        message: String,
    },

    /// Non-2xx, non-304 HTTP status.
    #[error("http error: status {status}")]
    Http {
        /// The HTTP status code returned by the server.
        status: u16,
    },

    /// Response body was not the expected JSON envelope.
    #[error("decode error: {message}")]
    Decode {
        /// Details about the malformed payload.
        message: String,
    },

    /// The envelope arrived intact but carried `success: false`.
    #[error("request rejected: {message}")]
    Rejected {
        /// Server-supplied rejection reason, if any.
        message: String,
    },

    /// The request was aborted because a newer one replaced it or the
    /// consumer detached. Not a failure.
    #[error("request superseded")]
    Superseded,

    /// The runtime is shutting down. Not a failure.
    #[error("poll cancelled")]
    Canceled,
}

impl PollError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::PollError;
    ///
    /// let err = PollError::Http { status: 503 };
    /// assert_eq!(err.as_label(), "http_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Network { .. } => "network_failure",
            PollError::Http { .. } => "http_error",
            PollError::Decode { .. } => "decode_error",
            PollError::Rejected { .. } => "request_rejected",
            PollError::Superseded => "request_superseded",
            PollError::Canceled => "poll_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PollError::Network { message } => format!("network: {message}"),
            PollError::Http { status } => format!("http status {status}"),
            PollError::Decode { message } => format!("decode: {message}"),
            PollError::Rejected { message } => format!("rejected: {message}"),
            PollError::Superseded => "superseded".to_string(),
            PollError::Canceled => "cancelled".to_string(),
        }
    }

    /// Indicates whether the error counts as a genuine failure that should
    /// drive backoff and reach `on_error`.
    ///
    /// Returns `false` for [`PollError::Superseded`] and
    /// [`PollError::Canceled`] — those are cooperative cancellations, not
    /// failures.
    ///
    /// # Example
    /// ```
    /// use pollvisor::PollError;
    ///
    /// assert!(PollError::Network { message: "refused".into() }.is_retryable());
    /// assert!(!PollError::Superseded.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PollError::Superseded | PollError::Canceled)
    }
}

/// Consumer-facing error record.
///
/// Stored per key by the registry (see `Poller::last_error`) and passed to
/// `PollHandler::on_error`. Carries a stable label, the full message, and the
/// wall-clock time the failure was observed.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Stable snake_case label, see [`PollError::as_label`].
    pub label: &'static str,
    /// Human-readable details.
    pub message: Arc<str>,
    /// When the failure was observed.
    pub at: SystemTime,
}

impl ErrorInfo {
    /// Builds an [`ErrorInfo`] from a [`PollError`] at the current instant.
    pub fn from_error(err: &PollError) -> Self {
        Self {
            label: err.as_label(),
            message: err.as_message().into(),
            at: SystemTime::now(),
        }
    }
}
