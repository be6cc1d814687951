//! OpenAI service for chat completions and embeddings.
//!
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions: chat completion (non-streaming)
//! - POST {endpoint}/v1/embeddings: embeddings retrieval (honors `dimensions`)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use reqwest::header::{self, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{build_client, header_value, post_json, require_key, validate_cfg},
};

/// Thin client for the OpenAI API.
///
/// High-level operations:
/// - [`OpenAiService::generate`]: single, non-streaming chat completion
/// - [`OpenAiService::embeddings`]: single embeddings vector retrieval
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        validate_cfg(&cfg, LlmProvider::OpenAI)?;
        let api_key = require_key(&cfg)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header_value(Provider::OpenAI, &format!("Bearer {api_key}"))?,
        );
        let client = build_client(&cfg, headers)?;

        let base = cfg.base_url().to_string();
        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            url_chat: format!("{base}/v1/chat/completions"),
            url_embeddings: format!("{base}/v1/embeddings"),
            cfg,
        })
    }

    /// Performs a chat completion with an optional system message.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses, `Decode` for bad payloads
    /// - `EmptyChoices` if no choice carries content
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);
        let out: ChatCompletionResponse = post_json(
            &self.client,
            Provider::OpenAI,
            &self.cfg.model,
            &self.url_chat,
            &body,
            "choices[0].message.content",
        )
        .await?;

        out.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices).into())
    }

    /// Retrieves a single embeddings vector.
    ///
    /// `cfg.dimensions` is forwarded so `text-embedding-3-*` models can return
    /// shortened vectors matching the collection layout.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
            dimensions: self.cfg.dimensions,
        };
        let out: EmbeddingsResponse = post_json(
            &self.client,
            Provider::OpenAI,
            &self.cfg.model,
            &self.url_embeddings,
            &body,
            "data[0].embedding",
        )
        .await?;

        out.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode("empty `data` in embeddings response".into()),
                )
                .into()
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(content) = system {
            messages.push(ChatMessage {
                role: "system",
                content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
