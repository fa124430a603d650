//! Run metrics.
//!
//! Timings are collected for every run; they are cheap (a handful of
//! `Instant::now()` calls) and end up in the [`crate::RunReport`] so the CLI
//! can print where the time went. Snapshot requests usually dominate because a
//! real source shells out to a device.
//!
//! ```text
//! total ─┬─ parse
//!        ├─ populate   (one snapshot request per definition)
//!        └─ evaluate   (every predicate, tier order)
//! ```

use serde::Serialize;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Splitting, tokenizing and checking the assertion.
    pub parse: Duration,
    /// Snapshot requests plus widget resolution.
    pub populate: Duration,
    /// Predicate execution.
    pub evaluate: Duration,
    /// Number of snapshot requests issued.
    pub snapshot_requests: usize,
    /// Number of predicates executed.
    pub predicates_evaluated: usize,
}
