use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use scout_core::error::{AppError, timeout_secs};
use scout_core::models::{Provider, QueryOptions};
use scout_core::traits::LanguageModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmConfig;
use crate::fetcher::map_reqwest_error;

const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const AZURE_API_VERSION: &str = "2023-05-15";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const GEMINI_VISION_MODEL: &str = "gemini-pro-vision";
const IMAGE_MEDIA_TYPE: &str = "image/jpeg";

fn default_base_url(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some("https://api.openai.com/v1"),
        Provider::Anthropic => Some("https://api.anthropic.com/v1"),
        Provider::DeepSeek => Some("https://api.deepseek.com/v1"),
        Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1"),
        // Per-tenant, comes from AZURE_OPENAI_ENDPOINT.
        Provider::Azure => None,
    }
}

/// JSON pointer to the generated text in each provider's response.
fn reply_pointer(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi | Provider::Azure | Provider::DeepSeek => "/choices/0/message/content",
        Provider::Anthropic => "/content/0/text",
        Provider::Gemini => "/candidates/0/content/parts/0/text",
    }
}

/// Multi-provider LLM client.
///
/// Each [`Provider`] gets its own request shape (endpoint, auth header,
/// payload layout); the reply text is pulled out of the response with a
/// per-provider JSON pointer. Missing fields in a reply yield an empty
/// string rather than an error.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    base_urls: HashMap<Provider, String>,
    timeout_secs: u64,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        Self::with_timeout(config, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(config: LlmConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        let mut base_urls: HashMap<Provider, String> = Provider::ALL
            .into_iter()
            .filter_map(|p| default_base_url(p).map(|url| (p, url.to_string())))
            .collect();
        if let Some(endpoint) = &config.azure_endpoint {
            base_urls.insert(Provider::Azure, endpoint.trim_end_matches('/').to_string());
        }

        Ok(Self {
            client,
            config,
            base_urls,
            timeout_secs: timeout_secs(timeout),
        })
    }

    /// Point `provider` at a different API root (proxies, tests).
    pub fn with_base_url(mut self, provider: Provider, base_url: &str) -> Self {
        self.base_urls
            .insert(provider, base_url.trim_end_matches('/').to_string());
        self
    }

    fn base_url(&self, provider: Provider) -> Result<&str, AppError> {
        self.base_urls
            .get(&provider)
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::ConfigError(format!("No API endpoint configured for {provider}"))
            })
    }

    /// Shape the HTTP request for `provider`. `image` is base64-encoded.
    fn prepare(
        &self,
        provider: Provider,
        prompt: &str,
        options: &QueryOptions,
        image: Option<&str>,
    ) -> Result<PreparedRequest, AppError> {
        let key = self.config.api_key(provider)?;
        let base = self.base_url(provider)?;

        let request = match provider {
            Provider::OpenAi => PreparedRequest {
                url: format!("{base}/chat/completions"),
                headers: vec![("authorization", format!("Bearer {key}"))],
                body: chat_body(Some(model_for(provider, options)), prompt, options, image)?,
            },
            Provider::Azure => PreparedRequest {
                url: format!(
                    "{base}/openai/deployments/{}/chat/completions?api-version={AZURE_API_VERSION}",
                    self.config.azure_deployment
                ),
                headers: vec![("api-key", key.to_string())],
                body: chat_body(None, prompt, options, image)?,
            },
            Provider::Anthropic => PreparedRequest {
                url: format!("{base}/messages"),
                headers: vec![
                    ("x-api-key", key.to_string()),
                    ("anthropic-version", ANTHROPIC_VERSION.to_string()),
                ],
                body: anthropic_body(model_for(provider, options), prompt, options, image)?,
            },
            Provider::DeepSeek => {
                if image.is_some() {
                    tracing::warn!("DeepSeek does not accept images; sending the prompt only");
                }
                PreparedRequest {
                    url: format!("{base}/chat/completions"),
                    headers: vec![("authorization", format!("Bearer {key}"))],
                    body: serde_json::to_value(ChatRequest {
                        model: Some(model_for(provider, options)),
                        messages: vec![ChatMessage {
                            role: "user",
                            content: ChatContent::Text(prompt.to_string()),
                        }],
                        temperature: options.temperature,
                        max_tokens: options.max_tokens,
                    })?,
                }
            }
            Provider::Gemini => {
                let model = match image {
                    Some(_) => GEMINI_VISION_MODEL.to_string(),
                    None => model_for(provider, options),
                };
                PreparedRequest {
                    url: format!("{base}/models/{model}:generateContent?key={key}"),
                    headers: Vec::new(),
                    body: gemini_body(prompt, options, image)?,
                }
            }
        };

        Ok(request)
    }
}

impl LanguageModel for LlmClient {
    async fn ask(
        &self,
        provider: Provider,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<String, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput("prompt must not be empty".into()));
        }
        self.config.api_key(provider)?;

        let image = match &options.image_path {
            Some(path) => Some(encode_image(path).await?),
            None => None,
        };
        let request = self.prepare(provider, prompt, options, image.as_deref())?;

        tracing::debug!(%provider, model = ?options.model, "Querying LLM");

        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));
            tracing::error!(%provider, %status_code, %message, "LLM query failed");
            return Err(AppError::LlmError {
                message,
                status_code,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {e}")))?;

        Ok(extract_reply(provider, &json))
    }
}

#[derive(Debug)]
struct PreparedRequest {
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Value,
}

fn model_for(provider: Provider, options: &QueryOptions) -> String {
    options
        .model
        .clone()
        .or_else(|| provider.default_model().map(str::to_string))
        .unwrap_or_default()
}

fn extract_reply(provider: Provider, response: &Value) -> String {
    response
        .pointer(reply_pointer(provider))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

async fn encode_image(path: &Path) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::InvalidInput(format!("Error processing image {}: {e}", path.display()))
    })?;
    Ok(STANDARD.encode(bytes))
}

// ---- OpenAI-style chat completions (OpenAI, Azure, DeepSeek) ----

#[derive(Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: ChatContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

fn chat_body(
    model: Option<String>,
    prompt: &str,
    options: &QueryOptions,
    image: Option<&str>,
) -> Result<Value, AppError> {
    let mut parts = vec![ChatPart::Text {
        text: prompt.to_string(),
    }];
    if let Some(data) = image {
        parts.push(ChatPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{IMAGE_MEDIA_TYPE};base64,{data}"),
            },
        });
    }

    Ok(serde_json::to_value(ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: ChatContent::Parts(parts),
        }],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    })?)
}

// ---- Anthropic messages ----

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

fn anthropic_body(
    model: String,
    prompt: &str,
    options: &QueryOptions,
    image: Option<&str>,
) -> Result<Value, AppError> {
    let mut content = vec![AnthropicPart::Text {
        text: prompt.to_string(),
    }];
    if let Some(data) = image {
        content.push(AnthropicPart::Image {
            source: ImageSource {
                kind: "base64",
                media_type: IMAGE_MEDIA_TYPE,
                data: data.to_string(),
            },
        });
    }

    Ok(serde_json::to_value(MessagesRequest {
        model,
        messages: vec![AnthropicMessage {
            role: "user",
            content,
        }],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    })?)
}

// ---- Gemini generateContent ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum GeminiPart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

fn gemini_body(prompt: &str, options: &QueryOptions, image: Option<&str>) -> Result<Value, AppError> {
    let mut parts = vec![GeminiPart::Text(prompt.to_string())];
    if let Some(data) = image {
        parts.push(GeminiPart::InlineData(InlineData {
            mime_type: IMAGE_MEDIA_TYPE,
            data: data.to_string(),
        }));
    }

    Ok(serde_json::to_value(GenerateRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        },
    })?)
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}
