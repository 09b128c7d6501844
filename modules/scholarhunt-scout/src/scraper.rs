use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use ai_client::util::truncate_to_char_boundary;
use scholarhunt_common::ScholarHuntError;

use crate::traits::{FetchOutcome, PageFetcher};

/// Per-request HTTP timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Stored text is capped here to bound storage and downstream prompt size.
const FULL_TEXT_MAX_BYTES: usize = 12_000;
/// PDFs are read page-by-page up to this cap.
const PDF_PAGE_CAP: u32 = 6;
/// pdftotext subprocess timeout.
const PDF_TIMEOUT: Duration = Duration::from_secs(20);

/// Rotating client identities. Sites that serve empty shells to unknown
/// agents generally accept any mainstream browser string.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Fetches a record's URL and reduces it to normalized plain text.
/// HTML goes through Readability main-content extraction; PDFs go through
/// a page-capped `pdftotext` subprocess.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> FetchOutcome {
        match self.fetch_inner(url).await {
            Ok(text) if text.trim().is_empty() => {
                FetchOutcome::Unreadable("empty content after extraction".into())
            }
            Ok(text) => {
                let text = truncate_to_char_boundary(&text, FULL_TEXT_MAX_BYTES).to_string();
                info!(url, bytes = text.len(), "Extracted text");
                FetchOutcome::Text(text)
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                FetchOutcome::Unreadable(e.to_string())
            }
        }
    }
}

impl HttpFetcher {
    async fn fetch_inner(&self, url: &str) -> anyhow::Result<String> {
        let parsed = url::Url::parse(url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScholarHuntError::Scraping(format!(
                "only http/https URLs are allowed, got: {}",
                parsed.scheme()
            ))
            .into());
        }

        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .expect("UA pool is non-empty");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, *user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let is_pdf = content_type.contains("pdf") || parsed.path().to_lowercase().ends_with(".pdf");
        let body = response.bytes().await?;

        if is_pdf {
            extract_pdf_text(&body).await
        } else {
            Ok(extract_html_text(&body, url))
        }
    }
}

/// Readability main-content extraction, whitespace collapsed.
fn extract_html_text(html: &[u8], url: &str) -> String {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);
    collapse_whitespace(&text)
}

/// Extract text from the first [`PDF_PAGE_CAP`] pages via pdftotext.
/// A missing binary or a scan-only PDF surfaces as an error, which the
/// caller downgrades to `Unreadable`.
async fn extract_pdf_text(bytes: &[u8]) -> anyhow::Result<String> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;

    let output = tokio::time::timeout(
        PDF_TIMEOUT,
        tokio::process::Command::new("pdftotext")
            .args(["-q", "-l", &PDF_PAGE_CAP.to_string()])
            .arg(file.path())
            .arg("-")
            .output(),
    )
    .await
    .map_err(|_| anyhow::anyhow!("pdftotext timed out after {}s", PDF_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        anyhow::bail!(
            "pdftotext exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(collapse_whitespace(&String::from_utf8_lossy(&output.stdout)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            collapse_whitespace("  a\n\n b\t\tc  "),
            "a b c"
        );
    }

    #[test]
    fn html_extraction_drops_scripts_and_styles() {
        let html = br#"<html><head><style>body { color: red }</style></head>
            <body><script>var tracker = 1;</script>
            <article>
              <h1>Nursing Scholarship 2026</h1>
              <p>The Nursing Excellence Scholarship supports undergraduate
              students enrolled in an accredited nursing program. Awards of
              $5,000 are made each year to students who demonstrate both
              academic merit and a commitment to community health work.</p>
              <p>Application deadline: 15 March 2026. Apply online.</p>
            </article>
            </body></html>"#;
        let text = extract_html_text(html, "https://example.org/a");
        assert!(text.contains("Nursing Excellence Scholarship"));
        assert!(text.contains("15 March 2026"));
        assert!(!text.contains("var tracker"));
        assert!(!text.contains("color: red"));
    }
}
