use std::future::Future;

use crate::error::AppError;
use crate::models::{Provider, QueryOptions};

/// Fetches the raw body of a URL with a single GET.
///
/// Implementations return the body only for a `200 OK` response. Any other
/// status is reported as [`AppError::HttpStatus`] without reading the body,
/// and timeouts must surface as [`AppError::Timeout`].
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into readable plain text.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Sends a prompt to an LLM provider and returns the generated text.
pub trait LanguageModel: Send + Sync + Clone {
    fn ask(
        &self,
        provider: Provider,
        prompt: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}
