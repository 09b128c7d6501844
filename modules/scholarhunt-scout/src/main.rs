use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::gemini::{self, Gemini};
use scholarhunt_common::Config;
use scholarhunt_scout::evolve::{base_ancestors, DorkEvolver};
use scholarhunt_scout::gc::GarbageCollector;
use scholarhunt_scout::hunter::Hunter;
use scholarhunt_scout::ingest::IngestRunner;
use scholarhunt_scout::oracles::{GoogleSearcher, TemplateMutator};
use scholarhunt_scout::scraper::HttpFetcher;
use scholarhunt_store::{migrate, RecordStore, TemplateStore, TopicStore};

#[derive(Parser)]
#[command(name = "scholarhunt", about = "Scholarship discovery engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one dork-evolution cycle: mutate, test, persist survivors.
    Evolve,
    /// Cross active topics with sampled templates and discover records.
    Hunt {
        /// Fix the template-sampling seed for a reproducible run.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fetch, extract, and classify unprocessed records.
    Ingest,
    /// Remove expired and stale records.
    Gc,
    /// Print the current record count.
    Stats,
}

// Crate names are hyphenated; tracing targets use underscores.
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("scholarhunt_scout=info".parse()?)
        .add_directive("scholarhunt_store=info".parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let cli = Cli::parse();

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    migrate(&pool).await?;

    match cli.command {
        Command::Evolve => {
            let searcher = GoogleSearcher::new(&config.google_api_key, &config.search_engine_id);
            let mutator =
                TemplateMutator::new(Gemini::new(&config.gemini_api_key, gemini::DEFAULT_MODEL));
            let templates = TemplateStore::new(pool.clone());

            let evolver = DorkEvolver::new(&mutator, &searcher, &templates);
            let stats = evolver.run().await;
            info!("Evolution cycle complete. {stats}");
        }
        Command::Hunt { seed } => {
            let searcher = GoogleSearcher::new(&config.google_api_key, &config.search_engine_id);
            let records = RecordStore::new(pool.clone());

            let topics = TopicStore::new(pool.clone()).active().await?;
            let mut templates = TemplateStore::new(pool.clone()).list().await?;
            if templates.is_empty() {
                info!("Template store is empty, hunting with base templates");
                templates = base_ancestors();
            }

            let mut hunter = Hunter::new(&searcher, &records, seed);
            let stats = hunter.run(&topics, &templates).await;
            info!("Hunt complete. {stats}");
        }
        Command::Ingest => {
            let fetcher = HttpFetcher::new();
            let records = RecordStore::new(pool.clone());

            let runner = IngestRunner::new(&fetcher, &records)
                .with_batch_size(config.ingest_batch_size)
                .with_workers(config.ingest_workers);
            let stats = runner.run().await;
            info!("Ingestion complete. {stats}");
        }
        Command::Gc => {
            let records = RecordStore::new(pool.clone());
            let stats = GarbageCollector::new(&records).sweep(chrono::Utc::now()).await;
            info!("Sweep complete. {stats}");
        }
        Command::Stats => {
            let count = RecordStore::new(pool.clone()).count().await?;
            println!("{count} scholarship records");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_directives_name_real_crate_targets() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("scholarhunt_scout=info"));
        assert!(filter.contains("scholarhunt_store=info"));
        assert!(!filter.contains("scholarhunt-"));
    }
}
