use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Google Programmable Search
    pub google_api_key: String,
    pub search_engine_id: String,

    // Gemini (template mutation)
    pub gemini_api_key: String,

    // Batch knobs
    pub ingest_batch_size: i64,
    pub ingest_workers: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing — missing
    /// credentials are fatal at process start, not mid-batch.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            google_api_key: required_env("GOOGLE_API_KEY"),
            search_engine_id: required_env("SEARCH_ENGINE_ID"),
            gemini_api_key: required_env("GEMINI_API_KEY"),
            ingest_batch_size: optional_parse("INGEST_BATCH_SIZE", 10),
            ingest_workers: optional_parse("INGEST_WORKERS", 4),
        }
    }

    /// Log the non-secret parts of the config at startup.
    pub fn log_redacted(&self) {
        info!(
            search_engine_id = %self.search_engine_id,
            ingest_batch_size = self.ingest_batch_size,
            ingest_workers = self.ingest_workers,
            "Config loaded (keys redacted)"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn optional_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
