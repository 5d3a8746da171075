pub mod cleaner;
pub mod config;
pub mod fetcher;
pub mod llm;
pub mod search;

pub use cleaner::{MainContentCleaner, extract_main_content};
pub use config::{LlmConfig, SearchConfig};
pub use fetcher::ReqwestFetcher;
pub use llm::LlmClient;
pub use search::SearchClient;
