//! Batch scrape pipeline: bounded-concurrency fetch followed by extraction.
//!
//! Every URL of a batch gets exactly one [`ExtractedDocument`], in input
//! order. Per-URL failures (transport faults, non-OK statuses, timeouts)
//! become failed records; only caller misuse fails the batch itself.

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::AppError;
use crate::models::{ExtractedDocument, FetchOutcome};
use crate::traits::{Cleaner, Fetcher};

/// Concurrency cap used when the caller does not override it.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Text stored in place of the content when extraction fails.
pub const EXTRACTION_ERROR_TEXT: &str = "Error extracting content";

const OK_STATUS: u16 = 200;

/// Configuration for a [`ScrapeService`].
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Maximum number of requests in flight at once.
    pub max_concurrent: usize,

    /// Time budget for a single request, not counting time spent queued.
    pub request_timeout: Duration,
}

impl ScrapeConfig {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Reject settings no batch could run with.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_concurrency(self.max_concurrent)?;
        if self.request_timeout.is_zero() {
            return Err(AppError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

fn validate_concurrency(max_concurrent: usize) -> Result<(), AppError> {
    if max_concurrent == 0 {
        return Err(AppError::InvalidInput(
            "max_concurrent must be at least 1".into(),
        ));
    }
    if max_concurrent > Semaphore::MAX_PERMITS {
        return Err(AppError::InvalidInput(format!(
            "max_concurrent must be at most {}",
            Semaphore::MAX_PERMITS
        )));
    }
    Ok(())
}

/// Orchestrates the batch pipeline: fetch → extract, for many URLs at once.
///
/// Generic over the fetcher and cleaner so tests can run without network
/// access.
#[derive(Clone)]
pub struct ScrapeService<F, C>
where
    F: Fetcher,
    C: Cleaner,
{
    fetcher: F,
    cleaner: C,
    config: ScrapeConfig,
}

impl<F, C> ScrapeService<F, C>
where
    F: Fetcher,
    C: Cleaner,
{
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self {
            fetcher,
            cleaner,
            config: ScrapeConfig::default(),
        }
    }

    pub fn with_config(fetcher: F, cleaner: C, config: ScrapeConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            cleaner,
            config,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Fetch and extract every URL, at most `max_concurrent` at a time
    /// (the configured cap when `None`).
    ///
    /// The returned records line up with `urls` by position.
    pub async fn scrape_urls<S: AsRef<str>>(
        &self,
        urls: &[S],
        max_concurrent: Option<usize>,
    ) -> Result<Vec<ExtractedDocument>, AppError> {
        let max_concurrent = max_concurrent.unwrap_or(self.config.max_concurrent);
        validate_concurrency(max_concurrent)?;

        // Owned by this batch only; dropped with every permit once all tasks finish.
        let limiter = Semaphore::new(max_concurrent);

        let tasks = urls.iter().map(|url| {
            let limiter = &limiter;
            async move {
                let outcome = self.fetch_one(limiter, url.as_ref()).await;
                self.extract(outcome)
            }
        });
        let documents = join_all(tasks).await;

        let succeeded = documents.iter().filter(|d| d.success()).count();
        tracing::info!(
            total = documents.len(),
            succeeded,
            failed = documents.len() - succeeded,
            "Batch scrape complete"
        );

        Ok(documents)
    }

    /// Fetch every URL without extracting, at most `max_concurrent` at a time.
    pub async fn fetch_all<S: AsRef<str>>(
        &self,
        urls: &[S],
        max_concurrent: usize,
    ) -> Result<Vec<FetchOutcome>, AppError> {
        validate_concurrency(max_concurrent)?;
        let limiter = Semaphore::new(max_concurrent);

        Ok(join_all(urls.iter().map(|url| self.fetch_one(&limiter, url.as_ref()))).await)
    }

    /// Turn a fetch outcome into its final record, consuming the raw body.
    pub fn extract(&self, outcome: FetchOutcome) -> ExtractedDocument {
        match outcome {
            FetchOutcome::Fetched { url, status, body } => {
                let content = self.cleaner.clean(&body).unwrap_or_else(|e| {
                    tracing::error!(%url, error = %e, "Error extracting content");
                    EXTRACTION_ERROR_TEXT.to_string()
                });
                tracing::debug!(
                    %url,
                    html_bytes = body.len(),
                    text_bytes = content.len(),
                    "Extracted content"
                );
                ExtractedDocument::extracted(url, status, content)
            }
            FetchOutcome::Failed { url, status, error } => {
                ExtractedDocument::failed(url, status, error)
            }
        }
    }

    async fn fetch_one(&self, limiter: &Semaphore, url: &str) -> FetchOutcome {
        let _permit = match limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return FetchOutcome::Failed {
                    url: url.to_string(),
                    status: None,
                    error: e.to_string(),
                };
            }
        };

        tracing::debug!(%url, "Fetching");
        let timeout = self.config.request_timeout;
        let result = match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timed_out(timeout)),
        };

        match result {
            Ok(body) => {
                tracing::debug!(%url, bytes = body.len(), "Fetched");
                FetchOutcome::Fetched {
                    url: url.to_string(),
                    status: OK_STATUS,
                    body,
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Fetch failed");
                FetchOutcome::Failed {
                    url: url.to_string(),
                    status: e.status_code(),
                    error: e.to_string(),
                }
            }
        }
    }
}
