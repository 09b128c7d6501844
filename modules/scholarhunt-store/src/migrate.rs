use sqlx::PgPool;
use tracing::info;

/// Idempotent schema bootstrap, run once at binary start.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scholarships (
            id              UUID         PRIMARY KEY DEFAULT gen_random_uuid(),
            title           TEXT         NOT NULL DEFAULT '',
            url             TEXT         NOT NULL UNIQUE,
            content_snippet TEXT,
            source_query    TEXT,
            is_processed    BOOLEAN      NOT NULL DEFAULT false,
            full_text       TEXT,
            deadline        DATE,
            is_active       BOOLEAN,
            created_at      TIMESTAMPTZ  NOT NULL DEFAULT now(),
            embedding       JSONB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS scholarships_unprocessed_idx
         ON scholarships (created_at) WHERE NOT is_processed",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_dorks (
            id            UUID         PRIMARY KEY DEFAULT gen_random_uuid(),
            dork_template TEXT         NOT NULL UNIQUE,
            created_at    TIMESTAMPTZ  NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id     UUID    PRIMARY KEY DEFAULT gen_random_uuid(),
            name   TEXT    NOT NULL UNIQUE,
            active BOOLEAN NOT NULL DEFAULT true
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Schema migration complete");
    Ok(())
}
