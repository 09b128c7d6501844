//! Postgres persistence for scholarship records, dork templates, and topics.
//!
//! The scholarships table is keyed by URL: the upsert there is the single
//! serialization point for concurrent discovery, and its column names are
//! the contract the UI and semantic-search subsystems read.

pub mod migrate;
pub mod records;
pub mod templates;
pub mod topics;

pub use migrate::migrate;
pub use records::RecordStore;
pub use templates::TemplateStore;
pub use topics::TopicStore;
