//! Concrete provider clients plus the HTTP plumbing they share.
//!
//! Every client is constructed from a complete [`LlmModelConfig`], validates
//! it up front, and normalizes upstream failures into [`ProviderError`].

pub mod anthropic_service;
pub mod gemini_service;
pub mod ollama_service;
pub mod open_ai_service;

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Checks that `cfg` targets `expected` and carries a usable endpoint.
pub(crate) fn validate_cfg(cfg: &LlmModelConfig, expected: LlmProvider) -> Result<(), AiLlmError> {
    let provider = Provider::from(expected);
    if cfg.provider != expected {
        return Err(ProviderError::new(provider, ProviderErrorKind::InvalidProvider).into());
    }
    let endpoint = cfg.endpoint.trim();
    if endpoint.is_empty() || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
        )
        .into());
    }
    Ok(())
}

/// Returns the configured API key or `MissingApiKey`.
pub(crate) fn require_key(cfg: &LlmModelConfig) -> Result<&str, AiLlmError> {
    cfg.api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::new(cfg.provider.into(), ProviderErrorKind::MissingApiKey).into()
        })
}

/// Builds a header value, mapping invalid bytes to a provider decode error.
pub(crate) fn header_value(
    provider: Provider,
    value: &str,
) -> Result<header::HeaderValue, AiLlmError> {
    header::HeaderValue::from_str(value).map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::Decode(format!("invalid header value: {e}")),
        )
        .into()
    })
}

/// Builds a `reqwest::Client` with the config timeout, compression and `headers`.
pub(crate) fn build_client(
    cfg: &LlmModelConfig,
    mut headers: HeaderMap,
) -> Result<reqwest::Client, AiLlmError> {
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .default_headers(headers)
        .build()?)
}

/// POSTs `body` as JSON and decodes a successful response into `T`.
///
/// Non-2xx responses become [`ProviderErrorKind::HttpStatus`] with a short body
/// snippet; undecodable payloads become [`ProviderErrorKind::Decode`] mentioning
/// the `expected` shape.
pub(crate) async fn post_json<B, T>(
    client: &reqwest::Client,
    provider: Provider,
    model: &str,
    url: &str,
    body: &B,
    expected: &str,
) -> Result<T, AiLlmError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let started = Instant::now();
    debug!(%provider, %model, "POST {}", url);

    let resp = client.post(url).json(body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %provider,
            %status,
            %url,
            %snippet,
            %model,
            latency_ms = started.elapsed().as_millis(),
            "provider returned non-success status"
        );

        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into());
    }

    match resp.json::<T>().await {
        Ok(v) => {
            debug!(
                %provider,
                %model,
                latency_ms = started.elapsed().as_millis(),
                "provider call completed"
            );
            Ok(v)
        }
        Err(e) => {
            error!(
                %provider,
                error = %e,
                %model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode provider response"
            );
            Err(ProviderError::new(
                provider,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `{expected}`")),
            )
            .into())
        }
    }
}
