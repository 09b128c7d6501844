use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScholarHuntError;

// --- Dork templates ---

/// The substitution slot every template must carry exactly once.
pub const TOPIC_SLOT: &str = "{topic}";

/// A parameterized search query with a single `{topic}` slot,
/// e.g. `site:.edu "{topic}" scholarship`.
///
/// Construction goes through [`DorkTemplate::parse`], which enforces the
/// slot invariant, so any template in circulation renders cleanly with an
/// arbitrary topic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DorkTemplate(String);

impl DorkTemplate {
    /// Validate raw text as a template. Requires exactly one `{topic}` slot
    /// and no other brace syntax that a substitution could mangle.
    pub fn parse(text: &str) -> Result<Self, ScholarHuntError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ScholarHuntError::Template("empty template".into()));
        }
        let slots = text.matches(TOPIC_SLOT).count();
        if slots != 1 {
            return Err(ScholarHuntError::Template(format!(
                "expected exactly one {TOPIC_SLOT} slot, found {slots}: {text}"
            )));
        }
        let stray_braces = text.replace(TOPIC_SLOT, "").contains(['{', '}']);
        if stray_braces {
            return Err(ScholarHuntError::Template(format!(
                "stray brace outside the {TOPIC_SLOT} slot: {text}"
            )));
        }
        Ok(Self(text.to_string()))
    }

    /// Substitute the topic into the slot.
    pub fn render(&self, topic: &str) -> String {
        self.0.replace(TOPIC_SLOT, topic)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DorkTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Topics ---

/// A field of study the hunter targets. Created externally; the core
/// only ever reads active topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

// --- Scholarship records ---

/// A discovered scholarship opportunity, keyed by URL.
///
/// Field names are the storage contract shared with the UI and the
/// semantic-search subsystem; renaming a column here breaks them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScholarshipRecord {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub content_snippet: Option<String>,
    pub source_query: Option<String>,
    pub is_processed: bool,
    pub full_text: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    /// Populated by the out-of-scope embedding batch job.
    pub embedding: Option<serde_json::Value>,
}

// --- Search oracle payloads ---

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A page of search results plus the engine's total-hits estimate.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub estimated_total: u64,
}

/// Recency restriction passed to the search oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Results from the last year only.
    PastYear,
    /// No recency restriction.
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips_topic() {
        let t = DorkTemplate::parse(r#"site:.edu "{topic}" scholarship"#).unwrap();
        assert_eq!(t.render("Optometry"), r#"site:.edu "Optometry" scholarship"#);
    }

    #[test]
    fn template_requires_exactly_one_slot() {
        assert!(DorkTemplate::parse("scholarship 2026").is_err());
        assert!(DorkTemplate::parse("{topic} {topic} scholarship").is_err());
    }

    #[test]
    fn template_rejects_stray_braces() {
        assert!(DorkTemplate::parse("{topic} scholarship {year}").is_err());
        assert!(DorkTemplate::parse("{topic} scholarship }").is_err());
    }

    #[test]
    fn template_renders_arbitrary_ascii_topics() {
        let t = DorkTemplate::parse(r#"filetype:pdf "{topic}" application"#).unwrap();
        for topic in ["Civil Engineering", "nursing", "A&E", "C++ programming"] {
            let q = t.render(topic);
            assert!(q.contains(topic));
            assert!(!q.contains(TOPIC_SLOT));
        }
    }
}
