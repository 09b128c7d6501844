use sqlx::PgPool;

use scholarhunt_common::Topic;

/// Read-only view of the topics table. Topics are created by the
/// profile/UI side of the system; the hunter only consumes active ones.
pub struct TopicStore {
    pool: PgPool,
}

impl TopicStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All topics currently flagged active, alphabetical for stable runs.
    pub async fn active(&self) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            "SELECT id, name, active FROM topics WHERE active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
