//! Web search across SerpAPI, Google Custom Search and DuckDuckGo Lite.
//!
//! The DuckDuckGo backend scrapes an HTML results page and needs no key,
//! so it is the fallback when no API credentials are configured. It is
//! best effort: a markup change on their side yields fewer or no results.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use scout_core::error::{AppError, timeout_secs};
use scout_core::models::{SearchEngine, SearchResult};
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::config::SearchConfig;
use crate::fetcher::map_reqwest_error;

const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const GOOGLE_MAX_RESULTS: usize = 10;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_endpoint(engine: SearchEngine) -> Option<&'static str> {
    match engine {
        SearchEngine::SerpApi => Some("https://serpapi.com/search"),
        SearchEngine::Google => Some("https://www.googleapis.com/customsearch/v1"),
        SearchEngine::DuckDuckGo => Some("https://lite.duckduckgo.com/lite/"),
        SearchEngine::Auto => None,
    }
}

/// Client dispatching a query to one of the search backends.
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    config: SearchConfig,
    endpoints: HashMap<SearchEngine, String>,
    timeout_secs: u64,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, AppError> {
        Self::with_timeout(config, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(config: SearchConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        let endpoints = [
            SearchEngine::SerpApi,
            SearchEngine::Google,
            SearchEngine::DuckDuckGo,
        ]
        .into_iter()
        .filter_map(|engine| default_endpoint(engine).map(|url| (engine, url.to_string())))
        .collect();

        Ok(Self {
            client,
            config,
            endpoints,
            timeout_secs: timeout_secs(timeout),
        })
    }

    /// Send `engine` queries to `endpoint` instead of the public API.
    pub fn with_endpoint(mut self, engine: SearchEngine, endpoint: &str) -> Self {
        self.endpoints.insert(engine, endpoint.to_string());
        self
    }

    /// Run `query` on `engine` and return at most `num_results` hits.
    pub async fn search(
        &self,
        query: &str,
        engine: SearchEngine,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("search query must not be empty".into()));
        }

        let engine = self.config.resolve(engine);
        tracing::debug!(%engine, %query, num_results, "Searching");

        let results = match engine {
            SearchEngine::SerpApi => self.search_serpapi(query, num_results).await,
            SearchEngine::Google => self.search_google(query, num_results).await,
            SearchEngine::DuckDuckGo | SearchEngine::Auto => {
                self.search_duckduckgo(query, num_results).await
            }
        };

        match &results {
            Ok(hits) => tracing::info!(%engine, hits = hits.len(), "Search complete"),
            Err(e) => tracing::error!(%engine, error = %e, "Search failed"),
        }
        results
    }

    async fn search_serpapi(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let key = self.config.serpapi_key.as_deref().ok_or_else(|| {
            AppError::ConfigError("SERPAPI_KEY environment variable not set".into())
        })?;
        let num = num_results.to_string();
        let url = self.endpoint_url(
            SearchEngine::SerpApi,
            &[("q", query), ("api_key", key), ("engine", "google"), ("num", &num)],
        )?;

        let response: SerpApiResponse = self.get_json(url).await?;
        Ok(into_results(response.organic_results, num_results))
    }

    async fn search_google(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let (key, cx) = match (&self.config.google_api_key, &self.config.google_cx) {
            (Some(key), Some(cx)) => (key, cx),
            _ => {
                return Err(AppError::ConfigError(
                    "Google Search API credentials not set".into(),
                ));
            }
        };
        let num = num_results.min(GOOGLE_MAX_RESULTS).to_string();
        let url = self.endpoint_url(
            SearchEngine::Google,
            &[("q", query), ("key", key), ("cx", cx), ("num", &num)],
        )?;

        let response: GoogleResponse = self.get_json(url).await?;
        Ok(into_results(response.items, num_results))
    }

    async fn search_duckduckgo(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let url = self.endpoint_url(SearchEngine::DuckDuckGo, &[("q", query)])?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SearchError(format!("HTTP {}", status.as_u16())));
        }
        let html = response
            .text()
            .await
            .map_err(|e| AppError::SearchError(format!("Failed to read results page: {e}")))?;

        parse_duckduckgo_lite(&html, num_results)
    }

    fn endpoint_url(&self, engine: SearchEngine, params: &[(&str, &str)]) -> Result<Url, AppError> {
        let base = self
            .endpoints
            .get(&engine)
            .ok_or_else(|| AppError::ConfigError(format!("No endpoint configured for {engine}")))?;
        Url::parse_with_params(base, params)
            .map_err(|e| AppError::ConfigError(format!("Invalid {engine} endpoint '{base}': {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SearchError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::SearchError(format!("Invalid response: {e}")))
    }
}

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<RawHit>,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<RawHit>,
}

/// Hit layout shared by SerpAPI and Google Custom Search.
#[derive(Deserialize)]
struct RawHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn into_results(hits: Vec<RawHit>, limit: usize) -> Vec<SearchResult> {
    hits.into_iter()
        .take(limit)
        .map(|hit| SearchResult {
            title: hit.title,
            url: hit.link,
            snippet: hit.snippet,
        })
        .collect()
}

/// Parse a DuckDuckGo Lite results page.
///
/// Link rows open a new result; the snippet row that follows fills in
/// the snippet of the most recent result.
fn parse_duckduckgo_lite(html: &str, limit: usize) -> Result<Vec<SearchResult>, AppError> {
    let rows = selector(".result-link, .result-snippet")?;
    let anchor = selector("a")?;
    let document = Html::parse_document(html);

    let mut results: Vec<SearchResult> = Vec::new();
    for row in document.select(&rows) {
        if row.value().has_class("result-link", scraper::CaseSensitivity::CaseSensitive) {
            if results.len() == limit {
                break;
            }
            let link = if row.value().name() == "a" {
                Some(row)
            } else {
                row.select(&anchor).next()
            };
            if let Some(link) = link {
                results.push(SearchResult {
                    title: link.text().collect::<String>().trim().to_string(),
                    url: link.value().attr("href").unwrap_or_default().to_string(),
                    snippet: String::new(),
                });
            }
        } else if let Some(last) = results.last_mut() {
            last.snippet = row.text().collect::<String>().trim().to_string();
        }
    }

    Ok(results)
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::SearchError(format!("bad selector '{css}': {e}")))
}
