use tracing::{info, warn};

use ai_client::util::strip_code_blocks;
use scholarhunt_common::DorkTemplate;

use crate::traits::{MutationOracle, SearchOracle, TemplateSink};

/// Most ancestors ever sent to the mutation oracle. Keeps the prompt compact.
pub const ANCESTOR_POOL_MAX: usize = 5;
/// Candidates requested per evolution cycle.
pub const CANDIDATES_PER_CYCLE: usize = 3;
/// A candidate survives iff its live result count is strictly greater than
/// this. Filters out over-specific dorks that would starve the hunter.
pub const SURVIVAL_THRESHOLD: u64 = 5;
/// Canonical topic used to exercise candidates against the search oracle.
pub const TEST_TOPIC: &str = "Civil Engineering";

/// Seed templates the pool always contains, even on an empty store.
pub fn base_ancestors() -> Vec<DorkTemplate> {
    [
        r#"site:.edu "{topic}" scholarship 2025 international"#,
        r#"filetype:pdf "{topic}" scholarship application 2025"#,
    ]
    .iter()
    .map(|t| DorkTemplate::parse(t).expect("base template is valid"))
    .collect()
}

/// Stats from one evolution cycle.
#[derive(Debug, Default)]
pub struct EvolveStats {
    pub candidates: u32,
    pub survivors: u32,
    pub died: u32,
    pub failed: u32,
}

impl std::fmt::Display for EvolveStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evolution: candidates={}, survivors={}, died={}, failed={}",
            self.candidates, self.survivors, self.died, self.failed
        )
    }
}

/// Evolves the dork-template pool: mutate ancestors, test each candidate
/// against live search, persist the survivors.
pub struct DorkEvolver<'a> {
    mutator: &'a dyn MutationOracle,
    searcher: &'a dyn SearchOracle,
    templates: &'a dyn TemplateSink,
}

impl<'a> DorkEvolver<'a> {
    pub fn new(
        mutator: &'a dyn MutationOracle,
        searcher: &'a dyn SearchOracle,
        templates: &'a dyn TemplateSink,
    ) -> Self {
        Self {
            mutator,
            searcher,
            templates,
        }
    }

    /// Run one evolution cycle. A malformed oracle response or a wholesale
    /// mutation failure yields zero survivors, never an error — the next
    /// scheduled cycle just tries again.
    pub async fn run(&self) -> EvolveStats {
        let mut stats = EvolveStats::default();

        let ancestors = self.ancestor_pool().await;
        info!(pool = ancestors.len(), "Starting evolution cycle");

        let raw = match self.mutator.mutate(&ancestors, CANDIDATES_PER_CYCLE).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Mutation oracle call failed, no candidates this cycle");
                return stats;
            }
        };

        let candidates = parse_candidates(&raw);
        stats.candidates = candidates.len() as u32;
        if candidates.is_empty() {
            warn!("Mutation output yielded no usable candidates");
            return stats;
        }

        for candidate in candidates {
            let query = candidate.render(TEST_TOPIC);
            match self.searcher.result_count(&query).await {
                Ok(count) if count > SURVIVAL_THRESHOLD => {
                    info!(template = candidate.as_str(), hits = count, "Survivor found");
                    match self.templates.insert_if_new(&candidate).await {
                        Ok(_) => stats.survivors += 1,
                        Err(e) => {
                            warn!(template = candidate.as_str(), error = %e, "Failed to persist survivor");
                            stats.failed += 1;
                        }
                    }
                }
                Ok(count) => {
                    info!(template = candidate.as_str(), hits = count, "Candidate died");
                    stats.died += 1;
                }
                Err(e) => {
                    warn!(template = candidate.as_str(), error = %e, "Candidate evaluation failed");
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Ancestor pool: stored templates (newest first) plus the base seeds,
    /// deduplicated by literal text, truncated to [`ANCESTOR_POOL_MAX`].
    async fn ancestor_pool(&self) -> Vec<DorkTemplate> {
        let stored = match self.templates.list().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to load stored templates, using base ancestors only");
                Vec::new()
            }
        };

        let mut pool = Vec::new();
        for template in stored.into_iter().chain(base_ancestors()) {
            if !pool.contains(&template) {
                pool.push(template);
            }
            if pool.len() == ANCESTOR_POOL_MAX {
                break;
            }
        }
        pool
    }
}

/// Strictly parse mutation-oracle output into validated templates.
///
/// Accepts a JSON array of strings (with or without markdown fences) or a
/// plain newline-delimited list. Anything else yields an empty vec. The
/// text is data, never evaluated. Entries failing the slot invariant are
/// dropped with a warning.
pub fn parse_candidates(raw: &str) -> Vec<DorkTemplate> {
    let cleaned = strip_code_blocks(raw);

    let entries: Vec<String> = match serde_json::from_str::<Vec<String>>(cleaned) {
        Ok(list) => list,
        Err(_) => cleaned
            .lines()
            .map(|line| {
                strip_quote_pair(line.trim().trim_start_matches(['-', '*']).trim()).to_string()
            })
            .filter(|line| !line.is_empty())
            .collect(),
    };

    entries
        .iter()
        .filter_map(|text| match DorkTemplate::parse(text) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(candidate = text.as_str(), error = %e, "Rejected malformed candidate");
                None
            }
        })
        .collect()
}

/// Remove one wrapping quote pair, if any. A line that merely starts with
/// a quoted phrase (`"{topic}" scholarship site:.edu`) is left alone —
/// stripping only the leading quote would persist an unbalanced dork.
fn strip_quote_pair(line: &str) -> &str {
    for quote in ['"', '\''] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            return &line[1..line.len() - 1];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_array() {
        let raw = "```json\n[\"site:.edu \\\"{topic}\\\" grant\", \"filetype:pdf {topic} bursary\"]\n```";
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].as_str(), r#"site:.edu "{topic}" grant"#);
    }

    #[test]
    fn parses_bare_json_array() {
        let candidates = parse_candidates(r#"["{topic} scholarship intitle:application"]"#);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn parses_newline_list() {
        let raw = "- site:.org \"{topic}\" tuition waiver\n* filetype:pdf {topic} award\n";
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].as_str(), "filetype:pdf {topic} award");
    }

    #[test]
    fn quotes_strip_only_as_a_wrapping_pair() {
        let raw = "\"{topic}\" scholarship site:.edu\n\
                   '{topic}' bursary award\n\
                   \"filetype:pdf {topic} grant\"";
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].as_str(), r#""{topic}" scholarship site:.edu"#);
        assert_eq!(candidates[1].as_str(), "'{topic}' bursary award");
        assert_eq!(candidates[2].as_str(), "filetype:pdf {topic} grant");
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_candidates("Sure! Here are some great ideas.").is_empty());
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates("{\"not\": \"a list\"}").is_empty());
    }

    #[test]
    fn drops_candidates_missing_the_slot() {
        let raw = "[\"{topic} scholarship\", \"scholarship 2026 no slot\"]";
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn base_ancestors_satisfy_slot_invariant() {
        assert_eq!(base_ancestors().len(), 2);
    }
}
