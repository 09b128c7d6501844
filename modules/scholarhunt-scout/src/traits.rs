// Trait seams for the batch jobs' external collaborators.
//
// SearchOracle — web search (result pages + count estimates).
// MutationOracle — candidate-template generation; output is raw text,
//   defensively parsed by the evolver, never executed.
// PageFetcher — URL → extracted plain text.
// RecordSink / TemplateSink — persistence, implemented by the Postgres
//   stores and by in-memory mocks in `testing`.
//
// Every job receives its collaborators by injection; there are no
// process-wide client singletons.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use scholarhunt_common::{DorkTemplate, Freshness, ScholarshipRecord, SearchHit, SearchPage};
use scholarhunt_store::{RecordStore, TemplateStore};

// ---------------------------------------------------------------------------
// SearchOracle
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SearchOracle: Send + Sync {
    /// Run a query and return one page of results. A quota/auth failure is
    /// an `Err`, distinguishable from a successful empty page.
    async fn search(&self, query: &str, freshness: Freshness) -> Result<SearchPage>;

    /// The engine's estimated total hit count for a query.
    async fn result_count(&self, query: &str) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// MutationOracle
// ---------------------------------------------------------------------------

#[async_trait]
pub trait MutationOracle: Send + Sync {
    /// Ask for `count` new template candidates derived from `ancestors`.
    /// Returns the model's raw text; the caller parses it strictly.
    async fn mutate(&self, ancestors: &[DorkTemplate], count: usize) -> Result<String>;
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Outcome of fetching one URL. All failure modes (network, non-2xx,
/// timeout, unextractable content) fold into `Unreadable` with a reason —
/// the caller must still mark the record processed either way, so nothing
/// here is an abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Text(String),
    Unreadable(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> FetchOutcome;
}

// ---------------------------------------------------------------------------
// RecordSink / TemplateSink
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn upsert_discovery(&self, hit: &SearchHit, source_query: &str) -> Result<()>;
    async fn unprocessed_batch(&self, limit: i64) -> Result<Vec<ScholarshipRecord>>;
    async fn save_extraction(
        &self,
        id: Uuid,
        full_text: &str,
        deadline: Option<NaiveDate>,
        is_active: bool,
    ) -> Result<()>;
    async fn mark_processed(&self, id: Uuid) -> Result<()>;
    async fn delete_expired(&self, today: NaiveDate) -> Result<u64>;
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
impl RecordSink for RecordStore {
    async fn upsert_discovery(&self, hit: &SearchHit, source_query: &str) -> Result<()> {
        Ok(RecordStore::upsert_discovery(self, hit, source_query).await?)
    }

    async fn unprocessed_batch(&self, limit: i64) -> Result<Vec<ScholarshipRecord>> {
        Ok(RecordStore::unprocessed_batch(self, limit).await?)
    }

    async fn save_extraction(
        &self,
        id: Uuid,
        full_text: &str,
        deadline: Option<NaiveDate>,
        is_active: bool,
    ) -> Result<()> {
        Ok(RecordStore::save_extraction(self, id, full_text, deadline, is_active).await?)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        Ok(RecordStore::mark_processed(self, id).await?)
    }

    async fn delete_expired(&self, today: NaiveDate) -> Result<u64> {
        Ok(RecordStore::delete_expired(self, today).await?)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        Ok(RecordStore::delete_stale(self, cutoff).await?)
    }

    async fn count(&self) -> Result<i64> {
        Ok(RecordStore::count(self).await?)
    }
}

#[async_trait]
pub trait TemplateSink: Send + Sync {
    /// Idempotent insert by exact literal text. Returns true if inserted.
    async fn insert_if_new(&self, template: &DorkTemplate) -> Result<bool>;
    /// Stored templates, newest first.
    async fn list(&self) -> Result<Vec<DorkTemplate>>;
}

#[async_trait]
impl TemplateSink for TemplateStore {
    async fn insert_if_new(&self, template: &DorkTemplate) -> Result<bool> {
        Ok(TemplateStore::insert_if_new(self, template).await?)
    }

    async fn list(&self) -> Result<Vec<DorkTemplate>> {
        Ok(TemplateStore::list(self).await?)
    }
}
