use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use scholarhunt_common::DorkTemplate;

/// Manages dork templates in Postgres. Identity is the literal template text.
pub struct TemplateStore {
    pool: PgPool,
}

impl TemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a template unless one with identical literal text exists.
    /// Dedup is exact string match, not semantic. Returns true if inserted.
    pub async fn insert_if_new(&self, template: &DorkTemplate) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM search_dorks WHERE dork_template = $1)",
        )
        .bind(template.as_str())
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Ok(false);
        }

        sqlx::query("INSERT INTO search_dorks (id, dork_template) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(template.as_str())
            .execute(&self.pool)
            .await?;

        info!(template = template.as_str(), "Saved survivor template");
        Ok(true)
    }

    /// All stored templates, newest first. Rows that fail the slot invariant
    /// (hand-edited or legacy) are skipped with a warning rather than
    /// poisoning the whole pool.
    pub async fn list(&self) -> Result<Vec<DorkTemplate>, sqlx::Error> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT dork_template FROM search_dorks ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|text| match DorkTemplate::parse(&text) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(template = text.as_str(), error = %e, "Skipping invalid stored template");
                    None
                }
            })
            .collect())
    }
}
