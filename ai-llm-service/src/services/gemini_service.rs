//! Google Gemini service (Generative Language API).
//!
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//! - POST {endpoint}/v1beta/models/{model}:embedContent
//!
//! The API key travels in the `x-goog-api-key` header so it never shows up
//! in logged URLs.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{build_client, header_value, post_json, require_key, validate_cfg},
};

/// Thin client for Gemini text generation and embeddings.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embed: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`].
    ///
    /// # Errors
    /// - `InvalidProvider`, `MissingApiKey`, `InvalidEndpoint` on bad config
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        validate_cfg(&cfg, LlmProvider::Gemini)?;
        let api_key = require_key(&cfg)?;

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", header_value(Provider::Gemini, api_key)?);
        let client = build_client(&cfg, headers)?;

        let base = format!("{}/v1beta/models/{}", cfg.base_url(), cfg.model);
        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            url_generate: format!("{base}:generateContent"),
            url_embed: format!("{base}:embedContent"),
            cfg,
        })
    }

    /// Generates text; `system` maps to `systemInstruction`.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, system);
        let out: GenerateResponse = post_json(
            &self.client,
            Provider::Gemini,
            &self.cfg.model,
            &self.url_generate,
            &body,
            "candidates[0].content.parts[].text",
        )
        .await?;

        let text: String = out
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyChoices).into());
        }
        Ok(text)
    }

    /// Embeds a single text via `embedContent`.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbedRequest {
            content: Content {
                role: None,
                parts: vec![Part { text: input }],
            },
            output_dimensionality: self.cfg.dimensions,
        };
        let out: EmbedResponse = post_json(
            &self.client,
            Provider::Gemini,
            &self.cfg.model,
            &self.url_embed,
            &body,
            "embedding.values",
        )
        .await?;
        Ok(out.embedding.values)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: s }],
            }),
            generation_config: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_system_instruction() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: Some("k".into()),
            max_tokens: Some(2048),
            temperature: Some(0.7),
            top_p: None,
            timeout_secs: None,
            dimensions: None,
        };
        let body = GenerateRequest::from_cfg(&cfg, "hi", Some("sys"));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 2048);

        let svc = GeminiService::new(cfg).unwrap();
        assert!(svc.url_generate.ends_with("/v1beta/models/gemini-1.5-flash:generateContent"));
    }

    #[test]
    fn response_parts_are_concatenated() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"[1,"},{"text":"2]"}]}}]}"#;
        let out: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = out.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "[1,2]");
    }
}
