use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::traits::RecordSink;

/// Records older than this are deleted regardless of deadline or
/// processing state — after a year the page has almost certainly changed.
pub const STALENESS_DAYS: i64 = 365;

/// Stats from one garbage-collection sweep.
#[derive(Debug, Default)]
pub struct SweepStats {
    pub expired: u64,
    pub stale: u64,
    pub remaining: i64,
}

impl std::fmt::Display for SweepStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GC: expired={}, stale={}, remaining={}",
            self.expired, self.stale, self.remaining
        )
    }
}

/// Removes expired and stale records. Deletes are hard — there is no
/// tombstone or undo.
pub struct GarbageCollector<'a> {
    records: &'a dyn RecordSink,
}

impl<'a> GarbageCollector<'a> {
    pub fn new(records: &'a dyn RecordSink) -> Self {
        Self { records }
    }

    /// Run both sweeps. Each delete is its own failure boundary: a failed
    /// expiry sweep still lets the staleness sweep run.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepStats {
        let mut stats = SweepStats::default();

        let today = now.date_naive();
        match self.records.delete_expired(today).await {
            Ok(removed) => stats.expired = removed,
            Err(e) => warn!(error = %e, "Expiry sweep failed"),
        }

        let cutoff = now - Duration::days(STALENESS_DAYS);
        match self.records.delete_stale(cutoff).await {
            Ok(removed) => stats.stale = removed,
            Err(e) => warn!(error = %e, "Staleness sweep failed"),
        }

        match self.records.count().await {
            Ok(count) => stats.remaining = count,
            Err(e) => warn!(error = %e, "Failed to count remaining records"),
        }

        info!("{stats}");
        stats
    }
}
