// Test mocks for the scout batch jobs.
//
// One mock per trait boundary:
// - MockSearcher (SearchOracle) — HashMap-based query→page/count
// - MockMutator (MutationOracle) — canned raw model output
// - MockFetcher (PageFetcher) — HashMap-based url→outcome
// - MemoryRecords (RecordSink) — stateful in-memory record table
// - MemoryTemplates (TemplateSink) — stateful in-memory template pool
//
// No network, no database. `cargo test` in seconds.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use scholarhunt_common::{DorkTemplate, Freshness, ScholarshipRecord, SearchHit, SearchPage};

use crate::traits::{FetchOutcome, MutationOracle, PageFetcher, RecordSink, SearchOracle, TemplateSink};

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// HashMap-based search oracle. Returns `Err` for unregistered queries so
/// a test never silently exercises an unexpected query. Records every
/// query issued.
#[derive(Default)]
pub struct MockSearcher {
    pages: HashMap<String, SearchPage>,
    counts: HashMap<String, u64>,
    failing: HashSet<String>,
    issued: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, query: &str, page: SearchPage) -> Self {
        self.pages.insert(query.to_string(), page);
        self
    }

    pub fn on_count(mut self, query: &str, count: u64) -> Self {
        self.counts.insert(query.to_string(), count);
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    /// Queries issued so far, in order.
    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchOracle for MockSearcher {
    async fn search(&self, query: &str, _freshness: Freshness) -> Result<SearchPage> {
        self.issued.lock().unwrap().push(query.to_string());
        if self.failing.contains(query) {
            bail!("canned search failure: {query}");
        }
        match self.pages.get(query) {
            Some(page) => Ok(page.clone()),
            None => bail!("no canned search page for: {query}"),
        }
    }

    async fn result_count(&self, query: &str) -> Result<u64> {
        self.issued.lock().unwrap().push(query.to_string());
        if self.failing.contains(query) {
            bail!("canned count failure: {query}");
        }
        match self.counts.get(query) {
            Some(count) => Ok(*count),
            None => bail!("no canned count for: {query}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockMutator
// ---------------------------------------------------------------------------

/// Mutation oracle returning a fixed raw response. Records the ancestor
/// pools it was called with.
pub struct MockMutator {
    raw: Option<String>,
    pub calls: Mutex<Vec<Vec<DorkTemplate>>>,
}

impl MockMutator {
    /// Always answer with `raw`.
    pub fn returning(raw: &str) -> Self {
        Self {
            raw: Some(raw.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fail, as a dead generation API would.
    pub fn failing() -> Self {
        Self {
            raw: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ancestor_pools(&self) -> Vec<Vec<DorkTemplate>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MutationOracle for MockMutator {
    async fn mutate(&self, ancestors: &[DorkTemplate], _count: usize) -> Result<String> {
        self.calls.lock().unwrap().push(ancestors.to_vec());
        match &self.raw {
            Some(raw) => Ok(raw.clone()),
            None => bail!("canned mutation failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// HashMap-based page fetcher. Unregistered URLs come back `Unreadable`,
/// matching the production fetcher's everything-folds-to-unreadable shape.
#[derive(Default)]
pub struct MockFetcher {
    outcomes: HashMap<String, FetchOutcome>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text(mut self, url: &str, text: &str) -> Self {
        self.outcomes
            .insert(url.to_string(), FetchOutcome::Text(text.to_string()));
        self
    }

    pub fn on_unreadable(mut self, url: &str, reason: &str) -> Self {
        self.outcomes
            .insert(url.to_string(), FetchOutcome::Unreadable(reason.to_string()));
        self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> FetchOutcome {
        self.outcomes
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Unreadable("no canned response".to_string()))
    }
}

// ---------------------------------------------------------------------------
// MemoryRecords
// ---------------------------------------------------------------------------

/// In-memory record table with the same upsert semantics as the Postgres
/// store: identity is the URL, and re-discovery never downgrades
/// processing state or clears extraction fields.
#[derive(Default)]
pub struct MemoryRecords {
    rows: Mutex<Vec<ScholarshipRecord>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-built row, bypassing upsert. Lets tests control
    /// `created_at` and processing state directly.
    pub fn seed(self, record: ScholarshipRecord) -> Self {
        self.rows.lock().unwrap().push(record);
        self
    }

    pub fn rows(&self) -> Vec<ScholarshipRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn get(&self, url: &str) -> Option<ScholarshipRecord> {
        self.rows.lock().unwrap().iter().find(|r| r.url == url).cloned()
    }
}

#[async_trait]
impl RecordSink for MemoryRecords {
    async fn upsert_discovery(&self, hit: &SearchHit, source_query: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|r| r.url == hit.url) {
            existing.title = hit.title.clone();
            existing.content_snippet = Some(hit.snippet.clone());
            existing.source_query = Some(source_query.to_string());
        } else {
            rows.push(ScholarshipRecord {
                id: Uuid::new_v4(),
                title: hit.title.clone(),
                url: hit.url.clone(),
                content_snippet: Some(hit.snippet.clone()),
                source_query: Some(source_query.to_string()),
                is_processed: false,
                full_text: None,
                deadline: None,
                is_active: None,
                created_at: Utc::now(),
                embedding: None,
            });
        }
        Ok(())
    }

    async fn unprocessed_batch(&self, limit: i64) -> Result<Vec<ScholarshipRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| !r.is_processed)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn save_extraction(
        &self,
        id: Uuid,
        full_text: &str,
        deadline: Option<NaiveDate>,
        is_active: bool,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.full_text = Some(full_text.to_string());
            row.deadline = deadline;
            row.is_active = Some(is_active);
            row.is_processed = true;
        }
        Ok(())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.is_processed = true;
        }
        Ok(())
    }

    async fn delete_expired(&self, today: NaiveDate) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.deadline.is_none_or(|d| d >= today));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

// ---------------------------------------------------------------------------
// MemoryTemplates
// ---------------------------------------------------------------------------

/// In-memory template pool, newest first like the Postgres store.
#[derive(Default)]
pub struct MemoryTemplates {
    templates: Mutex<Vec<DorkTemplate>>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(self, template: DorkTemplate) -> Self {
        self.templates.lock().unwrap().insert(0, template);
        self
    }

    pub fn all(&self) -> Vec<DorkTemplate> {
        self.templates.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateSink for MemoryTemplates {
    async fn insert_if_new(&self, template: &DorkTemplate) -> Result<bool> {
        let mut templates = self.templates.lock().unwrap();
        if templates.contains(template) {
            return Ok(false);
        }
        templates.insert(0, template.clone());
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<DorkTemplate>> {
        Ok(self.templates.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A minimal unprocessed record for pipeline tests.
pub fn make_record(url: &str) -> ScholarshipRecord {
    ScholarshipRecord {
        id: Uuid::new_v4(),
        title: format!("Scholarship at {url}"),
        url: url.to_string(),
        content_snippet: None,
        source_query: None,
        is_processed: false,
        full_text: None,
        deadline: None,
        is_active: None,
        created_at: Utc::now(),
        embedding: None,
    }
}

pub fn make_hit(url: &str) -> SearchHit {
    SearchHit {
        title: format!("Scholarship at {url}"),
        url: url.to_string(),
        snippet: "A snippet".to_string(),
    }
}
