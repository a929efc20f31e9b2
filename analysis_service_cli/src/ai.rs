use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::TIMEOUT_SECONDS;

pub const DEFAULT_MODEL: &str = "gemini-3-pro";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid adapter configuration: {0}")]
    Config(String),

    #[error("Gemini API call failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini API call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini API blocked the prompt: {0}")]
    Blocked(String),

    #[error("Gemini API returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Sampling parameters sent with every call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub params: GenerationParams,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECONDS),
            params: GenerationParams::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base_url}/models/{model}:generateContent`
    pub fn endpoint(&self) -> Result<Url, AdapterError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AdapterError::Config(format!("base url {:?}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                AdapterError::Config(format!("base url {:?} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:generateContent", self.model));
        Ok(url)
    }
}

/// One prompt in, one block of generated text out.
///
/// Implementations do not retry; a failed call surfaces as an [`AdapterError`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdapterError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    params: GenerationParams,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AdapterError> {
        if config.api_key.trim().is_empty() {
            return Err(AdapterError::Config("api key is empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::builder().timeout(config.timeout).build()?,
            endpoint: config.endpoint()?,
            api_key: config.api_key,
            params: config.params,
        })
    }

    fn headers(&self) -> Result<HeaderMap, AdapterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| AdapterError::Config("api key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdapterError> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": self.params.temperature,
                "topP": self.params.top_p,
                "topK": self.params.top_k,
                "maxOutputTokens": self.params.max_output_tokens
            }
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        result.into_text()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, AdapterError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AdapterError::Blocked(reason));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::MalformedResponse("no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(AdapterError::MalformedResponse(format!(
                "candidate has no text (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}
