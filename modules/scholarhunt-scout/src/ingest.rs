use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::{stream, StreamExt};
use tracing::{info, warn};

use scholarhunt_common::ScholarshipRecord;

use crate::classify::classify;
use crate::deadline;
use crate::pacer::Pacer;
use crate::traits::{FetchOutcome, PageFetcher, RecordSink};

/// Concurrent fetches in flight. Each unit of work is independent; the
/// pacer, not the worker count, bounds the request rate.
pub const DEFAULT_WORKERS: usize = 4;
/// Records pulled per ingestion run.
pub const DEFAULT_BATCH_SIZE: i64 = 10;
/// Minimum spacing between outbound fetches.
const FETCH_INTERVAL: Duration = Duration::from_secs(2);
/// Whole-batch deadline. In-flight fetches are dropped when it passes.
const BATCH_DEADLINE: Duration = Duration::from_secs(300);

/// Stats from one ingestion run.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub processed: u32,
    pub extracted: u32,
    pub unreadable: u32,
    pub with_deadline: u32,
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ingest: processed={}, extracted={}, unreadable={}, with_deadline={}",
            self.processed, self.extracted, self.unreadable, self.with_deadline
        )
    }
}

/// Outcome of one record's trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Extracted { found_deadline: bool },
    Unreadable,
    StoreFailed,
}

/// Drives unprocessed records through fetch → deadline detection →
/// classification → storage.
pub struct IngestRunner<'a> {
    fetcher: &'a dyn PageFetcher,
    records: &'a dyn RecordSink,
    pacer: Pacer,
    batch_size: i64,
    workers: usize,
}

impl<'a> IngestRunner<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, records: &'a dyn RecordSink) -> Self {
        Self {
            fetcher,
            records,
            pacer: Pacer::new(FETCH_INTERVAL),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Process one batch of unprocessed records. Every record in the batch
    /// ends up marked processed — fetch and parse failures downgrade to
    /// "no text", they never leave a record stuck for the next run.
    pub async fn run(&self) -> IngestStats {
        let today = Utc::now().date_naive();
        let batch = match self.records.unprocessed_batch(self.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "Failed to load unprocessed batch");
                return IngestStats::default();
            }
        };

        if batch.is_empty() {
            info!("No unprocessed records");
            return IngestStats::default();
        }

        info!(count = batch.len(), "Starting ingestion batch");

        let drain = stream::iter(batch)
            .map(|record| self.process(record, today))
            .buffer_unordered(self.workers)
            .collect::<Vec<RecordOutcome>>();

        let outcomes = match tokio::time::timeout(BATCH_DEADLINE, drain).await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                warn!(
                    deadline_secs = BATCH_DEADLINE.as_secs(),
                    "Batch deadline hit, dropping in-flight fetches"
                );
                Vec::new()
            }
        };

        let mut stats = IngestStats::default();
        for outcome in outcomes {
            stats.processed += 1;
            match outcome {
                RecordOutcome::Extracted { found_deadline } => {
                    stats.extracted += 1;
                    if found_deadline {
                        stats.with_deadline += 1;
                    }
                }
                RecordOutcome::Unreadable => stats.unreadable += 1,
                RecordOutcome::StoreFailed => {}
            }
        }

        info!("{stats}");
        stats
    }

    async fn process(&self, record: ScholarshipRecord, today: NaiveDate) -> RecordOutcome {
        self.pacer.wait().await;

        match self.fetcher.fetch_text(&record.url).await {
            FetchOutcome::Text(text) => {
                let detected = deadline::detect(&text, today);
                let classification = classify(detected, today);
                match self
                    .records
                    .save_extraction(
                        record.id,
                        &text,
                        classification.deadline,
                        classification.is_active,
                    )
                    .await
                {
                    Ok(()) => RecordOutcome::Extracted {
                        found_deadline: detected.is_some(),
                    },
                    Err(e) => {
                        warn!(url = record.url.as_str(), error = %e, "Failed to save extraction");
                        RecordOutcome::StoreFailed
                    }
                }
            }
            FetchOutcome::Unreadable(reason) => {
                // Mark processed anyway so the record is not retried forever.
                warn!(url = record.url.as_str(), reason = reason.as_str(), "Page unreadable");
                if let Err(e) = self.records.mark_processed(record.id).await {
                    warn!(url = record.url.as_str(), error = %e, "Failed to mark record processed");
                    return RecordOutcome::StoreFailed;
                }
                RecordOutcome::Unreadable
            }
        }
    }
}
