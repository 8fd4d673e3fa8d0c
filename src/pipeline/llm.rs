//! Inference: send one prompt, get one text reply.
//!
//! Both generators need exactly one operation from the model service, so the
//! seam is the single-method [`InferenceClient`] trait. Implementations:
//!
//! * [`GeminiClient`] — Google's `generateContent` REST endpoint, called with
//!   an explicit API key. The default.
//! * [`ProviderClient`] — any `edgequake-llm` provider (OpenAI, Anthropic,
//!   Ollama, …) created by `ProviderFactory`.
//!
//! There is no retry: a failed call fails the stage that made it.

use crate::config::{PipelineConfig, API_KEY_ENV};
use crate::error::{InferenceError, MindmapError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default base URL of the Gemini API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generates text from a prompt using a fixed model.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Submit `prompt` and return the raw reply text. An empty string is a
    /// valid transport-level result; generators decide whether it is usable.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Build the inference client the config asks for.
///
/// Resolution order:
/// 1. `config.inference` — a pre-built client, used as-is.
/// 2. `config.provider_name` other than `"gemini"` — an `edgequake-llm`
///    provider; its own credential variable is read by the factory.
/// 3. Gemini with `config.api_key`. A missing or blank key is
///    [`MindmapError::ConfigurationMissing`].
pub fn resolve_client(config: &PipelineConfig) -> Result<Arc<dyn InferenceClient>, MindmapError> {
    if let Some(ref client) = config.inference {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        if !name.eq_ignore_ascii_case("gemini") {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
                MindmapError::ConfigurationMissing {
                    what: format!("LLM provider '{name}'"),
                    hint: format!("{e}"),
                }
            })?;
            return Ok(Arc::new(ProviderClient::new(provider, model, config)));
        }
    }

    let key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| MindmapError::ConfigurationMissing {
            what: API_KEY_ENV.to_string(),
            hint: format!(
                "API key is missing. Set it with: export {API_KEY_ENV}=... \
                 (or pass --api-key, or choose another --provider)."
            ),
        })?;

    let client = GeminiClient::new(key, config.gemini_model())
        .with_generation(config.temperature, config.max_tokens)
        .with_timeout(Duration::from_secs(config.api_timeout_secs))
        .map_err(|e| MindmapError::Internal(format!("HTTP client: {e}")))?;
    Ok(Arc::new(client))
}

// ── Gemini ───────────────────────────────────────────────────────────────

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    generation: Option<GenerationConfig>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            generation: None,
        }
    }

    /// Point the client at another server (proxies, test doubles).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_generation(mut self, temperature: f32, max_output_tokens: usize) -> Self {
        self.generation = Some(GenerationConfig {
            temperature: Some(temperature),
            max_output_tokens: Some(max_output_tokens),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Full endpoint URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: self.generation.clone(),
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        debug!("Gemini request: model={}, {} prompt chars", self.model, prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| InferenceError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| InferenceError::Decode(e.to_string()))?;
        parsed.into_text()
    }
}

// Wire types for generateContent. Only the fields we read or send.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate. A response with
    /// no text yields `""`; a blocked prompt is an error.
    fn into_text(self) -> Result<String, InferenceError> {
        if self.candidates.is_empty() {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(InferenceError::Blocked { reason });
            }
        }

        Ok(self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// [`InferenceClient`] over any `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            model: model.into(),
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
            timeout_secs: config.api_timeout_secs,
        }
    }
}

#[async_trait]
impl InferenceClient for ProviderClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let messages = vec![ChatMessage::user(prompt)];
        let call = self.provider.chat(&messages, Some(&self.options));

        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| InferenceError::Timeout {
                secs: self.timeout_secs,
            })?
            .map_err(|e| InferenceError::Provider(e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.model, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}
