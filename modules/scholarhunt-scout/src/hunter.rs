use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use scholarhunt_common::{DorkTemplate, Freshness, Topic};

use crate::traits::{RecordSink, SearchOracle};

/// Per-topic query budget: sample at most this many templates, without
/// replacement, to respect search quota.
pub const TEMPLATES_PER_TOPIC: usize = 3;

/// Stats from one hunt cycle.
#[derive(Debug, Default)]
pub struct HuntStats {
    pub queries: u32,
    pub discovered: u64,
    pub failed_queries: u32,
}

impl std::fmt::Display for HuntStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hunt: queries={}, discovered={}, failed={}",
            self.queries, self.discovered, self.failed_queries
        )
    }
}

/// Cross-products active topics with a sampled subset of templates and
/// upserts every hit into the record store.
pub struct Hunter<'a> {
    searcher: &'a dyn SearchOracle,
    records: &'a dyn RecordSink,
    rng: StdRng,
}

impl<'a> Hunter<'a> {
    /// `seed` fixes the template sampling; pass `None` for an OS-seeded run.
    pub fn new(searcher: &'a dyn SearchOracle, records: &'a dyn RecordSink, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            searcher,
            records,
            rng,
        }
    }

    pub async fn run(&mut self, topics: &[Topic], templates: &[DorkTemplate]) -> HuntStats {
        let mut stats = HuntStats::default();

        if templates.is_empty() {
            warn!("No templates available, nothing to hunt with");
            return stats;
        }

        for topic in topics {
            let sampled = self.sample_templates(templates);
            for template in sampled {
                let query = template.render(&topic.name);
                stats.queries += 1;

                let page = match self.searcher.search(&query, Freshness::PastYear).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(query = query.as_str(), error = %e, "Search failed, skipping query");
                        stats.failed_queries += 1;
                        continue;
                    }
                };

                for hit in &page.hits {
                    match self.records.upsert_discovery(hit, &query).await {
                        Ok(()) => stats.discovered += 1,
                        Err(e) => {
                            warn!(url = hit.url.as_str(), error = %e, "Failed to save discovery")
                        }
                    }
                }
            }
        }

        info!("{stats}");
        stats
    }

    /// Uniform sample of `min(TEMPLATES_PER_TOPIC, |templates|)` templates
    /// without replacement.
    fn sample_templates(&mut self, templates: &[DorkTemplate]) -> Vec<DorkTemplate> {
        let amount = TEMPLATES_PER_TOPIC.min(templates.len());
        rand::seq::index::sample(&mut self.rng, templates.len(), amount)
            .iter()
            .map(|i| templates[i].clone())
            .collect()
    }
}
