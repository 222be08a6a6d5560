//! Scheduling policies for poll streams.
//!
//! This module contains the pure scheduling logic:
//! - [`IntervalPolicy`] — maps `(consecutive errors, workload)` to the next
//!   poll delay, with exponential backoff and activity-based speed-up /
//!   slow-down;
//! - [`Workload`] — the per-cycle activity signal supplied by the consumer;
//! - [`JitterPolicy`] — optional randomization of computed delays.
//!
//! Everything here is deterministic and side-effect-free (jitter excepted,
//! and off by default) — this is the unit most valuable to test in isolation.

mod interval;
mod jitter;

pub use interval::{IntervalPolicy, Workload};
pub use jitter::JitterPolicy;
