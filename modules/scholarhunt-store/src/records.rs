use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use scholarhunt_common::{ScholarshipRecord, SearchHit};

/// Manages scholarship records in Postgres. Identity is the URL.
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a discovered search hit keyed by URL.
    ///
    /// Re-discovery refreshes title/snippet/source_query only. It never
    /// downgrades `is_processed` and never touches `full_text`, `deadline`,
    /// or `is_active` — a re-discovered URL is the same document, and blind
    /// overwrite would re-queue completed work and lose extraction output.
    pub async fn upsert_discovery(
        &self,
        hit: &SearchHit,
        source_query: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO scholarships (id, title, url, content_snippet, source_query, is_processed)
            VALUES ($1, $2, $3, $4, $5, false)
            ON CONFLICT (url) DO UPDATE SET
                title = EXCLUDED.title,
                content_snippet = EXCLUDED.content_snippet,
                source_query = EXCLUDED.source_query
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&hit.title)
        .bind(&hit.url)
        .bind(&hit.snippet)
        .bind(source_query)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch up to `limit` records that have not been through the ingestion
    /// pipeline yet, oldest first.
    pub async fn unprocessed_batch(
        &self,
        limit: i64,
    ) -> Result<Vec<ScholarshipRecord>, sqlx::Error> {
        sqlx::query_as::<_, ScholarshipRecord>(
            r#"
            SELECT id, title, url, content_snippet, source_query, is_processed,
                   full_text, deadline, is_active, created_at, embedding
            FROM scholarships
            WHERE NOT is_processed
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Store extraction output and classification, flipping `is_processed`.
    pub async fn save_extraction(
        &self,
        id: Uuid,
        full_text: &str,
        deadline: Option<NaiveDate>,
        is_active: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE scholarships
            SET full_text = $2, deadline = $3, is_active = $4, is_processed = true
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(full_text)
        .bind(deadline)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip `is_processed` without storing text. Used when a fetch fails so
    /// the record is not retried forever.
    pub async fn mark_processed(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE scholarships SET is_processed = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete records whose deadline has passed. Returns rows removed.
    pub async fn delete_expired(&self, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scholarships WHERE deadline < $1")
            .bind(today)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(removed, "Removed expired scholarships");
        }
        Ok(removed)
    }

    /// Delete records created before `cutoff`, regardless of deadline or
    /// processing state. Returns rows removed.
    pub async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scholarships WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(removed, "Removed stale scholarships");
        }
        Ok(removed)
    }

    /// Total record count.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scholarships")
            .fetch_one(&self.pool)
            .await
    }
}
