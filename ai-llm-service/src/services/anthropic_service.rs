//! Anthropic Messages API client.
//!
//! - POST {endpoint}/v1/messages
//!
//! Anthropic has no embeddings endpoint; [`AnthropicService::embeddings`]
//! reports `Unsupported` instead of silently falling back to another provider.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{build_client, header_value, post_json, require_key, validate_cfg},
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
/// `max_tokens` is mandatory for the Messages API.
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug)]
pub struct AnthropicService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_messages: String,
}

impl AnthropicService {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        validate_cfg(&cfg, LlmProvider::Anthropic)?;
        let api_key = require_key(&cfg)?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header_value(Provider::Anthropic, api_key)?);
        headers.insert(
            "anthropic-version",
            header_value(Provider::Anthropic, ANTHROPIC_VERSION)?,
        );
        let client = build_client(&cfg, headers)?;

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "AnthropicService initialized"
        );

        Ok(Self {
            client,
            url_messages: format!("{}/v1/messages", cfg.base_url()),
            cfg,
        })
    }

    /// Sends a single user message; text blocks of the reply are concatenated.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = MessagesRequest {
            model: &self.cfg.model,
            max_tokens: self.cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.cfg.temperature,
            top_p: self.cfg.top_p,
        };
        let out: MessagesResponse = post_json(
            &self.client,
            Provider::Anthropic,
            &self.cfg.model,
            &self.url_messages,
            &body,
            "content[].text",
        )
        .await?;

        let text = out.text();
        if text.trim().is_empty() {
            return Err(
                ProviderError::new(Provider::Anthropic, ProviderErrorKind::EmptyChoices).into(),
            );
        }
        Ok(text)
    }

    pub async fn embeddings(&self, _input: &str) -> Result<Vec<f32>, AiLlmError> {
        Err(ProviderError::new(
            Provider::Anthropic,
            ProviderErrorKind::Unsupported("embeddings"),
        )
        .into())
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
