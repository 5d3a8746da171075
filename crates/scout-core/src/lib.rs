pub mod error;
pub mod models;
pub mod plan;
pub mod scrape;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use error::AppError;
pub use models::{
    ExtractedDocument, FetchOutcome, Provider, QueryOptions, SearchEngine, SearchResult,
};
pub use scrape::{ScrapeConfig, ScrapeService};
pub use traits::{Cleaner, Fetcher, LanguageModel};
