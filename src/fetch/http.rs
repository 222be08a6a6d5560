//! # Transport seam and the reqwest-backed fetcher.
//!
//! Executes one GET per poll cycle and classifies the raw response.
//!
//! ## Classification
//! ```text
//! 304                         → FetchOutcome::NotModified
//! non-2xx (other than 304)    → Err(PollError::Http { status })
//! 2xx, body not an envelope   → Err(PollError::Decode)
//! 2xx, envelope success=false → Err(PollError::Rejected)
//! 2xx, envelope success=true  → FetchOutcome::Fresh { data, meta, validators }
//! transport failure           → Err(PollError::Network)
//! cancelled mid-flight        → Err(PollError::Superseded)
//! ```
//!
//! ## Rules
//! - The expected body is the `{ success, data, meta? }` JSON envelope the
//!   REST backend serves; `message` is picked up for rejection details when
//!   present.
//! - Cancellation is cooperative: the request future is raced against the
//!   stream's token, and dropping it aborts the underlying transport.
//! - Response validators (`ETag` / `Last-Modified`) are captured so the next
//!   cycle can issue a conditional request.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::error::PollError;
use crate::fetch::descriptor::Validators;

/// Classified result of one poll cycle's GET.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server returned a decoded payload.
    Fresh {
        /// Envelope `data` field.
        data: Value,
        /// Envelope `meta` field, if present.
        meta: Option<Value>,
        /// Validators captured from response headers (may be empty).
        validators: Validators,
    },
    /// The server answered `304 Not Modified`; the held snapshot stands.
    NotModified,
}

/// Transport contract for one GET per cycle.
///
/// The scheduler depends on this trait, not on reqwest, so tests inject
/// scripted fetchers and the HTTP stack stays swappable.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Issues one GET and classifies the response.
    ///
    /// # Parameters
    /// - `url`: resolved target for this cycle
    /// - `headers`: static headers from the descriptor
    /// - `validators`: conditional-request state from prior cycles
    /// - `ctx`: stream cancellation token; implementations must return
    ///   [`PollError::Superseded`] promptly once it fires
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        validators: &Validators,
        ctx: CancellationToken,
    ) -> Result<FetchOutcome, PollError>;
}

/// JSON envelope served by the REST backend.
#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    meta: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes the response body into `(data, meta)` or a classified error.
fn decode_envelope(body: &[u8]) -> Result<(Value, Option<Value>), PollError> {
    let env: Envelope = serde_json::from_slice(body).map_err(|e| PollError::Decode {
        message: e.to_string(),
    })?;

    if !env.success {
        return Err(PollError::Rejected {
            message: env
                .message
                .unwrap_or_else(|| "server reported failure".to_string()),
        });
    }
    Ok((env.data, env.meta))
}

/// reqwest-backed [`Fetch`] implementation.
///
/// One shared client per poller; per-request state is limited to the headers
/// and validators passed in by the scheduler.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the poller configuration (user agent, optional
    /// request timeout).
    pub fn new(cfg: &PollerConfig) -> Result<Self, PollError> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| PollError::Network {
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }

    async fn fetch_inner(
        &self,
        url: &str,
        headers: &[(String, String)],
        validators: &Validators,
    ) -> Result<FetchOutcome, PollError> {
        let mut req = self.client.get(url).header(CACHE_CONTROL, "no-cache");
        for (name, value) in headers {
            req = req.header(name, value);
        }
        if let Some(etag) = &validators.etag {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(lm) = &validators.last_modified {
            req = req.header(IF_MODIFIED_SINCE, lm);
        }

        let resp = req.send().await.map_err(|e| PollError::Network {
            message: e.to_string(),
        })?;

        let status = resp.status();
        if status.as_u16() == 304 {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(PollError::Http {
                status: status.as_u16(),
            });
        }

        let fresh_validators = Validators {
            etag: header_string(&resp, ETAG),
            last_modified: header_string(&resp, LAST_MODIFIED),
        };

        let body = resp.bytes().await.map_err(|e| PollError::Network {
            message: e.to_string(),
        })?;
        let (data, meta) = decode_envelope(&body)?;

        Ok(FetchOutcome::Fresh {
            data,
            meta,
            validators: fresh_validators,
        })
    }
}

fn header_string(resp: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        validators: &Validators,
        ctx: CancellationToken,
    ) -> Result<FetchOutcome, PollError> {
        tokio::select! {
            // Dropping the request future aborts the transport.
            _ = ctx.cancelled() => Err(PollError::Superseded),
            res = self.fetch_inner(url, headers, validators) => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_envelope_success() {
        let body = br#"{"success":true,"data":[{"id":1}],"meta":{"total":1}}"#;
        let (data, meta) = decode_envelope(body).unwrap();
        assert!(data.is_array());
        assert_eq!(meta.unwrap()["total"], 1);
    }

    #[test]
    fn test_decode_envelope_without_meta() {
        let body = br#"{"success":true,"data":{"id":9,"status":"pending"}}"#;
        let (data, meta) = decode_envelope(body).unwrap();
        assert_eq!(data["status"], "pending");
        assert!(meta.is_none());
    }

    #[test]
    fn test_decode_envelope_rejection_uses_message() {
        let body = br#"{"success":false,"message":"cart expired"}"#;
        match decode_envelope(body) {
            Err(PollError::Rejected { message }) => assert_eq!(message, "cart expired"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_rejection_without_message() {
        let body = br#"{"success":false}"#;
        match decode_envelope(body) {
            Err(PollError::Rejected { message }) => {
                assert_eq!(message, "server reported failure")
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_malformed_is_decode_error() {
        match decode_envelope(b"<html>oops</html>") {
            Err(PollError::Decode { .. }) => {}
            other => panic!("expected Decode, got {other:?}"),
        }
        // Valid JSON, wrong shape.
        match decode_envelope(b"[1,2,3]") {
            Err(PollError::Decode { .. }) => {}
            other => panic!("expected Decode, got {other:?}"),
        }
    }
}
