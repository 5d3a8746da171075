use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Result of a single GET for one URL of a batch.
///
/// The body of a successful fetch lives here only until extraction runs;
/// it never reaches an [`ExtractedDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched {
        url: String,
        status: u16,
        body: String,
    },
    Failed {
        url: String,
        status: Option<u16>,
        error: String,
    },
}

impl FetchOutcome {
    pub fn url(&self) -> &str {
        match self {
            FetchOutcome::Fetched { url, .. } | FetchOutcome::Failed { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Per-URL record returned by a batch scrape.
///
/// Serializes to a mapping with `url` and `success`, plus `status`,
/// `error` and `extracted_content` when present. A successful record
/// always carries `extracted_content` and never `error`; a failed one
/// is the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    url: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_content: Option<String>,
}

impl ExtractedDocument {
    pub fn extracted(url: String, status: u16, content: String) -> Self {
        Self {
            url,
            success: true,
            status: Some(status),
            error: None,
            extracted_content: Some(content),
        }
    }

    pub fn failed(url: String, status: Option<u16>, error: String) -> Self {
        Self {
            url,
            success: false,
            status,
            error: Some(error),
            extracted_content: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn extracted_content(&self) -> Option<&str> {
        self.extracted_content.as_deref()
    }
}

/// A single hit returned by a search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// LLM provider a prompt is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Azure,
    Anthropic,
    DeepSeek,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Azure,
        Provider::Anthropic,
        Provider::DeepSeek,
        Provider::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Azure => "azure",
            Provider::Anthropic => "anthropic",
            Provider::DeepSeek => "deepseek",
            Provider::Gemini => "gemini",
        }
    }

    /// Model used when the caller does not pick one.
    ///
    /// Azure routes by deployment name instead, so it has none.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("gpt-4o"),
            Provider::Azure => None,
            Provider::Anthropic => Some("claude-3-5-sonnet-20241022"),
            Provider::DeepSeek => Some("deepseek-chat"),
            Provider::Gemini => Some("gemini-pro"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown provider '{s}'"))
    }
}

/// Generation options for a single LLM query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Overrides [`Provider::default_model`].
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Image attached to the prompt for multimodal models.
    pub image_path: Option<PathBuf>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 4000,
            image_path: None,
        }
    }
}

/// Search backend a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    /// Pick the first backend with credentials configured.
    #[default]
    Auto,
    SerpApi,
    Google,
    #[serde(rename = "ddg")]
    DuckDuckGo,
}

impl SearchEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Auto => "auto",
            SearchEngine::SerpApi => "serpapi",
            SearchEngine::Google => "google",
            SearchEngine::DuckDuckGo => "ddg",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SearchEngine::Auto),
            "serpapi" => Ok(SearchEngine::SerpApi),
            "google" => Ok(SearchEngine::Google),
            "ddg" | "duckduckgo" => Ok(SearchEngine::DuckDuckGo),
            _ => Err(format!("Unknown search engine: {s}")),
        }
    }
}
