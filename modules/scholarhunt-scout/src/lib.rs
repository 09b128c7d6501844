//! Scholarship discovery engine: evolves search-query templates against
//! live search feedback, hunts for opportunities, ingests and classifies
//! them, and garbage-collects what has expired.

pub mod classify;
pub mod deadline;
pub mod evolve;
pub mod gc;
pub mod hunter;
pub mod ingest;
pub mod oracles;
pub mod pacer;
pub mod scraper;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
