// End-to-end batch-job tests over the trait mocks: no network, no database.

use chrono::{Days, Duration, NaiveDate, Utc};

use scholarhunt_common::{DorkTemplate, SearchPage, Topic};
use scholarhunt_scout::evolve::{DorkEvolver, TEST_TOPIC};
use scholarhunt_scout::gc::GarbageCollector;
use scholarhunt_scout::hunter::Hunter;
use scholarhunt_scout::ingest::IngestRunner;
use scholarhunt_scout::testing::{
    make_hit, make_record, MemoryRecords, MemoryTemplates, MockFetcher, MockMutator, MockSearcher,
};
use uuid::Uuid;

fn topic(name: &str) -> Topic {
    Topic {
        id: Uuid::new_v4(),
        name: name.to_string(),
        active: true,
    }
}

fn template(text: &str) -> DorkTemplate {
    DorkTemplate::parse(text).unwrap()
}

fn page_with(urls: &[&str]) -> SearchPage {
    SearchPage {
        hits: urls.iter().map(|u| make_hit(u)).collect(),
        estimated_total: urls.len() as u64,
    }
}

// ---------------------------------------------------------------------------
// Hunter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hunter_issues_exactly_one_query_for_a_single_template() {
    let query = r#"site:.edu "Optometry" scholarship"#;
    let searcher = MockSearcher::new().on_search(query, page_with(&["https://a.edu/s1"]));
    let records = MemoryRecords::new();

    let templates = vec![template(r#"site:.edu "{topic}" scholarship"#)];
    let mut hunter = Hunter::new(&searcher, &records, Some(7));
    let stats = hunter.run(&[topic("Optometry")], &templates).await;

    assert_eq!(searcher.issued(), vec![query.to_string()]);
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.discovered, 1);

    let row = records.get("https://a.edu/s1").expect("row upserted");
    assert!(!row.is_processed);
    assert_eq!(row.source_query.as_deref(), Some(query));
}

#[tokio::test]
async fn hunter_samples_at_most_three_templates_per_topic() {
    let templates: Vec<DorkTemplate> = (0..5)
        .map(|i| template(&format!(r#"site:.edu "{{topic}}" scholarship v{i}"#)))
        .collect();

    let mut searcher = MockSearcher::new();
    for t in &templates {
        searcher = searcher.on_search(&t.render("Nursing"), SearchPage::default());
    }
    let records = MemoryRecords::new();

    let mut hunter = Hunter::new(&searcher, &records, Some(42));
    let stats = hunter.run(&[topic("Nursing")], &templates).await;

    assert_eq!(stats.queries, 3);
    assert_eq!(searcher.issued().len(), 3);
    // Without replacement: three distinct queries.
    let mut issued = searcher.issued();
    issued.sort();
    issued.dedup();
    assert_eq!(issued.len(), 3);
}

#[tokio::test]
async fn hunter_rediscovery_refreshes_metadata_without_resetting_state() {
    let url = "https://b.org/grant";
    let query = r#"site:.org "{topic}" grant"#.replace("{topic}", "Physics");

    let mut processed = make_record(url);
    processed.is_processed = true;
    processed.full_text = Some("extracted text".to_string());
    processed.deadline = NaiveDate::from_ymd_opt(2099, 1, 1);
    processed.is_active = Some(true);

    let searcher = MockSearcher::new().on_search(&query, page_with(&[url]));
    let records = MemoryRecords::new().seed(processed);

    let templates = vec![template(r#"site:.org "{topic}" grant"#)];
    let mut hunter = Hunter::new(&searcher, &records, Some(1));
    hunter.run(&[topic("Physics")], &templates).await;

    let row = records.get(url).unwrap();
    assert!(row.is_processed, "re-discovery must not re-queue the record");
    assert_eq!(row.full_text.as_deref(), Some("extracted text"));
    assert_eq!(row.deadline, NaiveDate::from_ymd_opt(2099, 1, 1));
    assert_eq!(row.source_query.as_deref(), Some(query.as_str()));
}

#[tokio::test]
async fn hunter_upsert_is_idempotent_by_url() {
    let query = r#"site:.edu "Optometry" scholarship"#;
    let page = page_with(&["https://a.edu/s1"]);
    let searcher = MockSearcher::new().on_search(query, page);
    let records = MemoryRecords::new();

    let templates = vec![template(r#"site:.edu "{topic}" scholarship"#)];
    Hunter::new(&searcher, &records, Some(3))
        .run(&[topic("Optometry")], &templates)
        .await;
    Hunter::new(&searcher, &records, Some(3))
        .run(&[topic("Optometry")], &templates)
        .await;

    assert_eq!(records.rows().len(), 1);
}

#[tokio::test]
async fn hunter_skips_failed_queries_and_continues() {
    let good = r#"site:.edu "History" scholarship"#;
    let bad = r#"filetype:pdf "History" application"#;
    let searcher = MockSearcher::new()
        .on_search(good, page_with(&["https://c.edu/s"]))
        .fail_on(bad);
    let records = MemoryRecords::new();

    let templates = vec![
        template(r#"site:.edu "{topic}" scholarship"#),
        template(r#"filetype:pdf "{topic}" application"#),
    ];
    let mut hunter = Hunter::new(&searcher, &records, Some(9));
    let stats = hunter.run(&[topic("History")], &templates).await;

    assert_eq!(stats.queries, 2);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.discovered, 1);
}

// ---------------------------------------------------------------------------
// DorkEvolver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evolver_selection_threshold_is_strictly_greater_than_five() {
    let dies = r#"site:.edu "{topic}" rare-qualifier"#;
    let survives = r#"filetype:pdf "{topic}" application form"#;
    let raw = format!(r#"["{}", "{}"]"#, dies.replace('"', r#"\""#), survives.replace('"', r#"\""#));

    let mutator = MockMutator::returning(&raw);
    let searcher = MockSearcher::new()
        .on_count(&template(dies).render(TEST_TOPIC), 5)
        .on_count(&template(survives).render(TEST_TOPIC), 6);
    let templates = MemoryTemplates::new();

    let stats = DorkEvolver::new(&mutator, &searcher, &templates).run().await;

    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.survivors, 1);
    assert_eq!(stats.died, 1);
    assert_eq!(templates.all(), vec![template(survives)]);
}

#[tokio::test]
async fn evolver_truncates_ancestor_pool_to_five_newest() {
    let mut store = MemoryTemplates::new();
    for i in 0..7 {
        store = store.seed(template(&format!(r#"site:.edu "{{topic}}" scholarship gen{i}"#)));
    }

    let mutator = MockMutator::returning("[]");
    let searcher = MockSearcher::new();
    DorkEvolver::new(&mutator, &searcher, &store).run().await;

    let pools = mutator.ancestor_pools();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].len(), 5);
    // seed() prepends, so gen6 is newest and the pool keeps gen6..gen2.
    assert_eq!(
        pools[0][0],
        template(r#"site:.edu "{topic}" scholarship gen6"#)
    );
    assert_eq!(
        pools[0][4],
        template(r#"site:.edu "{topic}" scholarship gen2"#)
    );
}

#[tokio::test]
async fn evolver_survivor_persistence_is_idempotent() {
    let survivor = r#"intitle:application "{topic}" bursary"#;
    let raw = format!(r#"["{}"]"#, survivor.replace('"', r#"\""#));

    let mutator = MockMutator::returning(&raw);
    let searcher = MockSearcher::new().on_count(&template(survivor).render(TEST_TOPIC), 100);
    let templates = MemoryTemplates::new().seed(template(survivor));

    let stats = DorkEvolver::new(&mutator, &searcher, &templates).run().await;

    // Counted as a survivor, but the pool still holds exactly one copy.
    assert_eq!(stats.survivors, 1);
    assert_eq!(templates.all().len(), 1);
}

#[tokio::test]
async fn evolver_malformed_oracle_output_yields_no_survivors() {
    let mutator = MockMutator::returning("I'm sorry, I can't help with that.");
    let searcher = MockSearcher::new();
    let templates = MemoryTemplates::new();

    let stats = DorkEvolver::new(&mutator, &searcher, &templates).run().await;

    assert_eq!(stats.candidates, 0);
    assert_eq!(stats.survivors, 0);
    assert!(templates.all().is_empty());
}

#[tokio::test]
async fn evolver_oracle_failure_is_nonfatal() {
    let mutator = MockMutator::failing();
    let searcher = MockSearcher::new();
    let templates = MemoryTemplates::new();

    let stats = DorkEvolver::new(&mutator, &searcher, &templates).run().await;

    assert_eq!(stats.candidates, 0);
    assert_eq!(stats.survivors, 0);
}

#[tokio::test]
async fn evolver_isolates_per_candidate_search_failures() {
    let broken = r#"site:.gov "{topic}" award"#;
    let fine = r#"site:.edu "{topic}" award"#;
    let raw = format!(
        r#"["{}", "{}"]"#,
        broken.replace('"', r#"\""#),
        fine.replace('"', r#"\""#)
    );

    let mutator = MockMutator::returning(&raw);
    let searcher = MockSearcher::new()
        .fail_on(&template(broken).render(TEST_TOPIC))
        .on_count(&template(fine).render(TEST_TOPIC), 50);
    let templates = MemoryTemplates::new();

    let stats = DorkEvolver::new(&mutator, &searcher, &templates).run().await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.survivors, 1);
    assert_eq!(templates.all(), vec![template(fine)]);
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ingest_extracts_detects_and_classifies() {
    let url = "https://a.edu/open";
    let text = "Great opportunity. Application Deadline: 15 March 2099. Apply now.";

    let fetcher = MockFetcher::new().on_text(url, text);
    let records = MemoryRecords::new().seed(make_record(url));

    let stats = IngestRunner::new(&fetcher, &records).run().await;

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.extracted, 1);
    assert_eq!(stats.with_deadline, 1);

    let row = records.get(url).unwrap();
    assert!(row.is_processed);
    assert_eq!(row.deadline, NaiveDate::from_ymd_opt(2099, 3, 15));
    assert_eq!(row.is_active, Some(true));
    assert_eq!(row.full_text.as_deref(), Some(text));
}

#[tokio::test]
async fn ingest_marks_expired_deadlines_inactive() {
    let url = "https://a.edu/closed";
    let text = "Application Deadline: 15 March 2019. Better luck next year.";

    let fetcher = MockFetcher::new().on_text(url, text);
    let records = MemoryRecords::new().seed(make_record(url));

    IngestRunner::new(&fetcher, &records).run().await;

    let row = records.get(url).unwrap();
    assert_eq!(row.deadline, NaiveDate::from_ymd_opt(2019, 3, 15));
    assert_eq!(row.is_active, Some(false));
}

#[tokio::test]
async fn ingest_without_deadline_defaults_to_active() {
    let url = "https://b.org/evergreen";
    let fetcher = MockFetcher::new().on_text(url, "Rolling admissions, apply any time.");
    let records = MemoryRecords::new().seed(make_record(url));

    IngestRunner::new(&fetcher, &records).run().await;

    let row = records.get(url).unwrap();
    assert_eq!(row.deadline, None);
    assert_eq!(row.is_active, Some(true));
}

#[tokio::test]
async fn ingest_marks_unreadable_pages_processed() {
    let url = "https://dead.example/404";
    let fetcher = MockFetcher::new().on_unreadable(url, "HTTP 404 Not Found");
    let records = MemoryRecords::new().seed(make_record(url));

    let stats = IngestRunner::new(&fetcher, &records).run().await;

    assert_eq!(stats.unreadable, 1);
    let row = records.get(url).unwrap();
    assert!(row.is_processed, "failed fetches must not be retried forever");
    assert_eq!(row.full_text, None);
    assert_eq!(row.is_active, None);
}

#[tokio::test]
async fn ingest_respects_batch_size() {
    let fetcher = MockFetcher::new()
        .on_text("https://a/1", "one")
        .on_text("https://a/2", "two")
        .on_text("https://a/3", "three");
    let records = MemoryRecords::new()
        .seed(make_record("https://a/1"))
        .seed(make_record("https://a/2"))
        .seed(make_record("https://a/3"));

    let stats = IngestRunner::new(&fetcher, &records)
        .with_batch_size(2)
        .run()
        .await;

    assert_eq!(stats.processed, 2);
    assert_eq!(
        records.rows().iter().filter(|r| r.is_processed).count(),
        2
    );
}

#[tokio::test]
async fn ingest_with_empty_store_is_a_noop() {
    let fetcher = MockFetcher::new();
    let records = MemoryRecords::new();

    let stats = IngestRunner::new(&fetcher, &records).run().await;
    assert_eq!(stats.processed, 0);
}

// ---------------------------------------------------------------------------
// GarbageCollector
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gc_removes_expired_and_stale_keeps_the_rest() {
    let now = Utc::now();
    let today = now.date_naive();

    let mut stale = make_record("https://old.example/s");
    stale.created_at = now - Duration::days(366);

    let mut fresh_enough = make_record("https://ok.example/s");
    fresh_enough.created_at = now - Duration::days(364);

    let mut expired = make_record("https://done.example/s");
    expired.deadline = today.checked_sub_days(Days::new(1));

    let mut open = make_record("https://open.example/s");
    open.deadline = Some(today);

    let records = MemoryRecords::new()
        .seed(stale)
        .seed(fresh_enough)
        .seed(expired)
        .seed(open);

    let stats = GarbageCollector::new(&records).sweep(now).await;

    assert_eq!(stats.expired, 1);
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.remaining, 2);
    assert!(records.get("https://old.example/s").is_none());
    assert!(records.get("https://done.example/s").is_none());
    assert!(records.get("https://ok.example/s").is_some());
    assert!(records.get("https://open.example/s").is_some());
}

#[tokio::test]
async fn gc_deletes_stale_records_even_when_unprocessed_and_active() {
    let now = Utc::now();

    let mut stale = make_record("https://forgotten.example/s");
    stale.created_at = now - Duration::days(400);
    stale.is_processed = false;
    stale.deadline = NaiveDate::from_ymd_opt(2099, 1, 1);

    let records = MemoryRecords::new().seed(stale);
    let stats = GarbageCollector::new(&records).sweep(now).await;

    assert_eq!(stats.stale, 1);
    assert_eq!(stats.remaining, 0);
}
