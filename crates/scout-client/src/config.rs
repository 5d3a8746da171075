use scout_core::error::AppError;
use scout_core::models::{Provider, SearchEngine};

const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4o-ms";

/// Credentials and endpoints for the LLM providers.
#[derive(Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: String,
    pub anthropic_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl LlmConfig {
    /// Read configuration from environment variables.
    ///
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `DEEPSEEK_API_KEY`, `GEMINI_API_KEY`
    /// - `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_ENDPOINT`
    /// - `AZURE_OPENAI_MODEL_DEPLOYMENT` (optional, defaults to `gpt-4o-ms`)
    ///
    /// Missing keys are not an error here; they surface when the provider
    /// is actually queried.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_var("OPENAI_API_KEY"),
            azure_api_key: env_var("AZURE_OPENAI_API_KEY"),
            azure_endpoint: env_var("AZURE_OPENAI_ENDPOINT"),
            azure_deployment: env_var("AZURE_OPENAI_MODEL_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string()),
            anthropic_api_key: env_var("ANTHROPIC_API_KEY"),
            deepseek_api_key: env_var("DEEPSEEK_API_KEY"),
            gemini_api_key: env_var("GEMINI_API_KEY"),
        }
    }

    /// API key for `provider`, or a configuration error naming the
    /// variable to set.
    pub fn api_key(&self, provider: Provider) -> Result<&str, AppError> {
        let (key, var) = match provider {
            Provider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            Provider::Azure => (&self.azure_api_key, "AZURE_OPENAI_API_KEY"),
            Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            Provider::DeepSeek => (&self.deepseek_api_key, "DEEPSEEK_API_KEY"),
            Provider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
        };
        key.as_deref()
            .ok_or_else(|| AppError::ConfigError(format!("{var} environment variable not set")))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            azure_api_key: None,
            azure_endpoint: None,
            azure_deployment: DEFAULT_AZURE_DEPLOYMENT.to_string(),
            anthropic_api_key: None,
            deepseek_api_key: None,
            gemini_api_key: None,
        }
    }
}

/// Credentials for the search backends.
#[derive(Clone, Default)]
pub struct SearchConfig {
    pub serpapi_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cx: Option<String>,
}

impl SearchConfig {
    /// Read `SERPAPI_KEY`, `GOOGLE_API_KEY` and `GOOGLE_CX`.
    pub fn from_env() -> Self {
        Self {
            serpapi_key: env_var("SERPAPI_KEY"),
            google_api_key: env_var("GOOGLE_API_KEY"),
            google_cx: env_var("GOOGLE_CX"),
        }
    }

    /// Resolve [`SearchEngine::Auto`] to the first backend with credentials,
    /// DuckDuckGo when none are configured.
    pub fn resolve(&self, engine: SearchEngine) -> SearchEngine {
        match engine {
            SearchEngine::Auto if self.serpapi_key.is_some() => SearchEngine::SerpApi,
            SearchEngine::Auto if self.google_api_key.is_some() && self.google_cx.is_some() => {
                SearchEngine::Google
            }
            SearchEngine::Auto => SearchEngine::DuckDuckGo,
            explicit => explicit,
        }
    }
}

/// Unset and empty variables both count as missing.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_names_the_variable() {
        let config = LlmConfig::default();
        let err = config.api_key(Provider::Anthropic).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: ANTHROPIC_API_KEY environment variable not set"
        );
    }

    #[test]
    fn test_present_key_is_returned() {
        let config = LlmConfig {
            gemini_api_key: Some("g-key".into()),
            ..LlmConfig::default()
        };
        assert_eq!(config.api_key(Provider::Gemini).unwrap(), "g-key");
        assert_eq!(config.azure_deployment, "gpt-4o-ms");
    }

    #[test]
    fn test_auto_engine_resolution_order() {
        let none = SearchConfig::default();
        assert_eq!(none.resolve(SearchEngine::Auto), SearchEngine::DuckDuckGo);

        let google_only = SearchConfig {
            google_api_key: Some("k".into()),
            google_cx: Some("cx".into()),
            ..SearchConfig::default()
        };
        assert_eq!(google_only.resolve(SearchEngine::Auto), SearchEngine::Google);

        let google_without_cx = SearchConfig {
            google_api_key: Some("k".into()),
            ..SearchConfig::default()
        };
        assert_eq!(
            google_without_cx.resolve(SearchEngine::Auto),
            SearchEngine::DuckDuckGo
        );

        let both = SearchConfig {
            serpapi_key: Some("s".into()),
            ..google_only
        };
        assert_eq!(both.resolve(SearchEngine::Auto), SearchEngine::SerpApi);
    }

    #[test]
    fn test_explicit_engine_is_kept() {
        let config = SearchConfig {
            serpapi_key: Some("s".into()),
            ..SearchConfig::default()
        };
        assert_eq!(config.resolve(SearchEngine::DuckDuckGo), SearchEngine::DuckDuckGo);
        assert_eq!(config.resolve(SearchEngine::Google), SearchEngine::Google);
    }
}
