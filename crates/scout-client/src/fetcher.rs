use std::time::Duration;

use reqwest::{Client, StatusCode};
use scout_core::error::{AppError, timeout_secs};
use scout_core::scrape::DEFAULT_REQUEST_TIMEOUT;
use scout_core::traits::Fetcher;
use url::Url;

const USER_AGENT: &str = "scout/0.1 (+agent tooling)";

/// HTTP fetcher using reqwest.
///
/// Downloads the raw body of a URL with a configurable timeout. Only a
/// `200 OK` response counts as a success; for any other status the body is
/// dropped unread.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout_secs(timeout),
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let parsed =
            Url::parse(url).map_err(|e| AppError::HttpError(format!("Invalid URL '{url}': {e}")))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}

/// Classify a reqwest failure so timeouts and connection faults stay
/// distinguishable from other HTTP errors.
pub(crate) fn map_reqwest_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}
