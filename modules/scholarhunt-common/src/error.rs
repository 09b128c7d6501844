use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScholarHuntError {
    #[error("Search error: {0}")]
    Search(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Invalid dork template: {0}")]
    Template(String),
}
