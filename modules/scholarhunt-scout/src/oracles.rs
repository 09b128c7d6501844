use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use ai_client::TextGenerator;
use scholarhunt_common::{DorkTemplate, Freshness, ScholarHuntError, SearchHit, SearchPage, TOPIC_SLOT};

use crate::traits::{MutationOracle, SearchOracle};

// --- Google Programmable Search ---

const SEARCH_API_URL: &str = "https://customsearch.googleapis.com/customsearch/v1";
const RESULTS_PER_PAGE: usize = 10;

pub struct GoogleSearcher {
    api_key: String,
    engine_id: String,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, serde::Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
    #[serde(rename = "searchInformation")]
    search_information: Option<CseSearchInformation>,
}

#[derive(Debug, serde::Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, serde::Deserialize)]
struct CseSearchInformation {
    #[serde(rename = "totalResults", default)]
    total_results: String,
}

impl GoogleSearcher {
    pub fn new(api_key: &str, engine_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: SEARCH_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn request(&self, query: &str, num: usize, freshness: Freshness) -> Result<CseResponse> {
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", query.to_string()),
            ("num", num.to_string()),
        ];
        if let Freshness::PastYear = freshness {
            params.push(("dateRestrict", "y1".to_string()));
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .context("Search API request failed")?;

        // Quota/auth failures come back 4xx. Surface them as errors so
        // callers never mistake them for a genuinely empty result set.
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ScholarHuntError::Search(format!("HTTP {status}: {body}")).into());
        }

        resp.json().await.context("Failed to parse search response")
    }
}

#[async_trait]
impl SearchOracle for GoogleSearcher {
    async fn search(&self, query: &str, freshness: Freshness) -> Result<SearchPage> {
        info!(query, "Google search");

        let data = self.request(query, RESULTS_PER_PAGE, freshness).await?;

        let estimated_total = data
            .search_information
            .as_ref()
            .and_then(|s| s.total_results.parse().ok())
            .unwrap_or(0);

        let hits: Vec<SearchHit> = data
            .items
            .into_iter()
            .filter(|i| !i.link.is_empty())
            .map(|i| SearchHit {
                title: i.title,
                url: i.link,
                snippet: i.snippet,
            })
            .collect();

        info!(query, count = hits.len(), "Google search complete");
        Ok(SearchPage {
            hits,
            estimated_total,
        })
    }

    async fn result_count(&self, query: &str) -> Result<u64> {
        let data = self.request(query, 1, Freshness::Any).await?;
        Ok(data
            .search_information
            .as_ref()
            .and_then(|s| s.total_results.parse().ok())
            .unwrap_or(0))
    }
}

// --- Template mutator over a text-generation backend ---

/// Builds the mutation prompt and forwards it to any [`TextGenerator`].
pub struct TemplateMutator<G> {
    generator: G,
}

impl<G: TextGenerator> TemplateMutator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> MutationOracle for TemplateMutator<G> {
    async fn mutate(&self, ancestors: &[DorkTemplate], count: usize) -> Result<String> {
        let ancestor_list = ancestors
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"ROLE: Elite search engineer.
TASK: Create {count} NEW, SIMPLIFIED search dork templates for finding currently-open scholarships.

CURRENT TEMPLATES:
{ancestor_list}

INSTRUCTIONS:
1. Every template must keep the {TOPIC_SLOT} placeholder, exactly once.
2. Bias toward high-precision qualifiers: 'site:.edu', 'filetype:pdf', 'intitle:application'.
3. Make them distinct from the current templates.
4. Return ONLY a JSON array of {count} strings. No commentary."#
        );

        self.generator.generate(&prompt).await
    }
}
