//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` or atomics so clones share state,
//! allowing assertions on recorded calls after the code under test ran.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{Provider, QueryOptions};
use crate::traits::{Cleaner, Fetcher, LanguageModel};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Canned answer for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Body(String),
    Status(u16),
    Timeout,
    NetworkError(String),
}

impl MockResponse {
    fn into_result(self, url: &str) -> Result<String, AppError> {
        match self {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Status(status) => Err(AppError::HttpStatus {
                status,
                url: url.to_string(),
            }),
            MockResponse::Timeout => Err(AppError::Timeout(30)),
            MockResponse::NetworkError(msg) => Err(AppError::NetworkError(msg)),
        }
    }
}

/// Mock fetcher with per-URL responses and delays.
///
/// Tracks how many fetches are running at the same time so tests can
/// assert on the peak.
#[derive(Clone)]
pub struct MockFetcher {
    default_body: String,
    default_delay: Duration,
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockFetcher {
    /// Every URL answers with `html` unless overridden.
    pub fn new(html: &str) -> Self {
        Self {
            default_body: html.to_string(),
            default_delay: Duration::ZERO,
            responses: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_response(self, url: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of simultaneous fetches observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the fetch future is dropped
/// by a timeout.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| MockResponse::Body(self.default_body.clone()));
        response.into_result(url)
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Mock cleaner that returns its input, or a one-shot error.
#[derive(Clone)]
pub struct MockCleaner {
    error: Arc<Mutex<Option<AppError>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCleaner {
    /// Creates a cleaner that returns the input unchanged.
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a cleaner whose first call returns an error.
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(html.to_string())
    }
}

// ---------------------------------------------------------------------------
// MockLanguageModel
// ---------------------------------------------------------------------------

/// Mock LLM that records prompts and answers with a fixed reply.
#[derive(Clone)]
pub struct MockLanguageModel {
    reply: Result<String, String>,
    pub prompts: Arc<Mutex<Vec<(Provider, String, QueryOptions)>>>,
}

impl MockLanguageModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every call fails with an [`AppError::LlmError`] carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl LanguageModel for MockLanguageModel {
    async fn ask(
        &self,
        provider: Provider,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<String, AppError> {
        self.prompts
            .lock()
            .unwrap()
            .push((provider, prompt.to_string(), options.clone()));
        self.reply.clone().map_err(|message| AppError::LlmError {
            message,
            status_code: 500,
        })
    }
}
