//! # Change detection: suppress redundant consumer notifications.
//!
//! [`ChangeDetector`] keeps the last accepted payload (the stream's
//! *snapshot*) plus a cheap fingerprint projected from it, and reports
//! whether a newly fetched payload differs materially. Only material changes
//! reach the consumer; everything else completes the cycle silently.
//!
//! ## Fingerprinting
//! The projection is configurable per stream. The default,
//! [`id_status_projection`], implements the order-dashboard heuristic:
//! - collections compare by **parallel position** — equal length and every
//!   element's `(id, status)` pair matching positionally means unchanged;
//!   any length difference, reorder, id or status mismatch means changed;
//! - single records compare by their `(id, status)` pair;
//! - anything without `id`/`status` falls back to whole-value deep equality.
//!
//! Irrelevant server-side churn (timestamps, counters) therefore never
//! triggers a notification. Streams that care about finer-grained fields
//! supply their own projection via [`ChangeDetector::with_projection`].
//!
//! ## Rules
//! - The snapshot is replaced wholesale on every accepted update, never
//!   partially mutated.
//! - The first payload of a stream is always a change.
//! - Comparison is by value (deep), never by object identity.

use std::sync::Arc;

use serde_json::Value;

/// Projection from a payload to its comparison fingerprint.
pub type ProjectFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Default fingerprint: identity + status.
///
/// Arrays project to a positional list of `[id, status]` pairs; objects to a
/// single `[id, status]` pair; scalars to themselves.
pub fn id_status_projection(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(project_record).collect()),
        other => project_record(other),
    }
}

fn project_record(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key("id") || map.contains_key("status") => {
            Value::Array(vec![
                map.get("id").cloned().unwrap_or(Value::Null),
                map.get("status").cloned().unwrap_or(Value::Null),
            ])
        }
        other => other.clone(),
    }
}

/// Per-stream change detector.
///
/// Owned by the stream's scheduler; one instance per poll key.
pub struct ChangeDetector {
    project: ProjectFn,
    fingerprint: Option<Value>,
    snapshot: Option<Arc<Value>>,
}

impl ChangeDetector {
    /// Creates a detector with the default id+status projection.
    pub fn new() -> Self {
        Self::with_projection(Arc::new(id_status_projection))
    }

    /// Creates a detector with a custom fingerprint projection.
    pub fn with_projection(project: ProjectFn) -> Self {
        Self {
            project,
            fingerprint: None,
            snapshot: None,
        }
    }

    /// Compares `next` against the held snapshot and, on material change,
    /// replaces the snapshot wholesale.
    ///
    /// Returns the shared handle to the new snapshot when the payload
    /// changed, `None` when the fingerprints match (consumer callback should
    /// be skipped).
    pub fn accept(&mut self, next: Value) -> Option<Arc<Value>> {
        let print = (self.project)(&next);
        if self.fingerprint.as_ref() == Some(&print) {
            return None;
        }

        let snapshot = Arc::new(next);
        self.fingerprint = Some(print);
        self.snapshot = Some(Arc::clone(&snapshot));
        Some(snapshot)
    }

    /// The last accepted payload, if any.
    pub fn snapshot(&self) -> Option<&Arc<Value>> {
        self.snapshot.as_ref()
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders(pairs: &[(u64, &str)]) -> Value {
        Value::Array(
            pairs
                .iter()
                .map(|(id, status)| json!({ "id": id, "status": status, "updated_at": id * 7 }))
                .collect(),
        )
    }

    #[test]
    fn test_first_payload_is_a_change() {
        let mut d = ChangeDetector::new();
        assert!(d.accept(orders(&[(1, "pending")])).is_some());
        assert!(d.snapshot().is_some());
    }

    #[test]
    fn test_identical_ids_and_statuses_are_unchanged() {
        let mut d = ChangeDetector::new();
        d.accept(orders(&[(1, "pending"), (2, "preparing")]));
        // Fresh allocation, same ids/statuses, different irrelevant fields.
        let mut again = orders(&[(1, "pending"), (2, "preparing")]);
        again[0]["updated_at"] = json!(999_999);
        assert!(d.accept(again).is_none());
    }

    #[test]
    fn test_single_status_flip_is_a_change() {
        let mut d = ChangeDetector::new();
        d.accept(orders(&[(1, "pending"), (2, "preparing")]));
        assert!(d.accept(orders(&[(1, "pending"), (2, "ready")])).is_some());
    }

    #[test]
    fn test_length_difference_is_a_change() {
        let mut d = ChangeDetector::new();
        d.accept(orders(&[(1, "pending"), (2, "preparing")]));
        assert!(d.accept(orders(&[(1, "pending")])).is_some());
    }

    #[test]
    fn test_reorder_is_a_change() {
        let mut d = ChangeDetector::new();
        d.accept(orders(&[(1, "pending"), (2, "preparing")]));
        assert!(d
            .accept(orders(&[(2, "preparing"), (1, "pending")]))
            .is_some());
    }

    #[test]
    fn test_single_record_compares_id_and_status_only() {
        let mut d = ChangeDetector::new();
        d.accept(json!({ "id": 42, "status": "preparing", "eta": 120 }));
        // Same id+status, different eta: not material.
        assert!(d
            .accept(json!({ "id": 42, "status": "preparing", "eta": 90 }))
            .is_none());
        // Status flip: material.
        assert!(d
            .accept(json!({ "id": 42, "status": "served", "eta": 0 }))
            .is_some());
    }

    #[test]
    fn test_scalar_payload_deep_equality() {
        let mut d = ChangeDetector::new();
        d.accept(json!({ "open": true, "staff": ["ana"] }));
        assert!(d.accept(json!({ "open": true, "staff": ["ana"] })).is_none());
        assert!(d
            .accept(json!({ "open": true, "staff": ["ana", "bo"] }))
            .is_some());
    }

    #[test]
    fn test_custom_projection() {
        // A stream that cares about item quantities, not statuses.
        let mut d = ChangeDetector::with_projection(Arc::new(|v: &Value| {
            v.get("quantity").cloned().unwrap_or(Value::Null)
        }));
        d.accept(json!({ "quantity": 2, "status": "pending" }));
        assert!(d.accept(json!({ "quantity": 2, "status": "ready" })).is_none());
        assert!(d.accept(json!({ "quantity": 3, "status": "ready" })).is_some());
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let mut d = ChangeDetector::new();
        d.accept(orders(&[(1, "pending")]));
        let first = Arc::clone(d.snapshot().unwrap());
        d.accept(orders(&[(1, "ready")]));
        let second = d.snapshot().unwrap();
        assert!(!Arc::ptr_eq(&first, second));
    }
}
