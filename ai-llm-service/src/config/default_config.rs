//! Default LLM configs loaded from environment variables.
//!
//! This module provides convenience constructors for [`LlmModelConfig`],
//! grouped by role:
//!
//! - **Generation** → chat/completion model used to write questions
//! - **Embedding**  → embedding model used for retrieval queries
//!
//! Environment is read once, at startup. The returned configs are plain values
//! that are passed explicitly into the services that need them.
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_PROVIDER`      = `openai` (default) | `google`/`gemini` | `anthropic`/`claude` | `ollama`
//! - `LLM_MODEL`         = model id (default per provider, see [`crate::catalog`])
//! - `LLM_TEMPERATURE`   = optional, default `0.7`, range `0.0..=2.0`
//! - `LLM_MAX_TOKENS`    = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`  = optional HTTP timeout (default 60)
//!
//! Embedding:
//! - `EMBEDDING_PROVIDER` = `openai` (default) | `google` | `ollama`
//! - `EMBEDDING_MODEL`    = default `text-embedding-3-small` (OpenAI), `text-embedding-004` (Gemini)
//! - `EMBEDDING_DIM`      = requested dimensions (default 384; unset for Ollama, which
//!   returns the model's native size)
//!
//! Credentials / endpoints:
//! - `OPENAI_API_KEY`, `GOOGLE_API_KEY`, `ANTHROPIC_API_KEY`
//! - `OPENAI_BASE_URL`, `GOOGLE_BASE_URL`, `ANTHROPIC_BASE_URL`
//! - `OLLAMA_URL` or `OLLAMA_PORT`, `OLLAMA_MODEL`

use tracing::warn;

use crate::{
    catalog,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint, validate_range_f32,
    },
};

/// Default embedding dimensionality (matches the Qdrant collection layout).
pub const DEFAULT_EMBEDDING_DIM: u32 = 384;

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
///
/// # Errors
///
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Ok(LlmProvider::Ollama.default_endpoint().to_string())
}

/// Resolves endpoint and API key for a provider.
fn endpoint_and_key(provider: LlmProvider) -> Result<(String, Option<String>), AiLlmError> {
    let endpoint = match provider {
        LlmProvider::Ollama => ollama_endpoint()?,
        _ => opt_env(provider.endpoint_var())
            .unwrap_or_else(|| provider.default_endpoint().to_string()),
    };
    validate_http_endpoint(provider.endpoint_var(), &endpoint)?;

    let api_key = match provider.api_key_var() {
        Some(var) => Some(must_env(var)?),
        None => None,
    };
    Ok((endpoint, api_key))
}

fn provider_from_env(var: &'static str) -> Result<LlmProvider, AiLlmError> {
    match opt_env(var) {
        Some(v) => Ok(v.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::OpenAI),
    }
}

/// Constructs the config for the **generation** model.
///
/// # Defaults
/// - `temperature = Some(0.7)`
/// - `timeout_secs = Some(60)`
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_PROVIDER`
/// - [`ConfigError::MissingVar`] if the provider's API key is absent
/// - [`ConfigError::OutOfRange`] if `LLM_TEMPERATURE` is outside `0.0..=2.0`
pub fn config_generation_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env("LLM_PROVIDER")?;
    let (endpoint, api_key) = endpoint_and_key(provider)?;

    let model = opt_env("LLM_MODEL")
        .or_else(|| {
            (provider == LlmProvider::Ollama)
                .then(|| opt_env("OLLAMA_MODEL"))
                .flatten()
        })
        .unwrap_or_else(|| catalog::default_model(provider).to_string());
    if !catalog::is_known_model(provider, &model) {
        warn!(%provider, %model, "model is not in the catalog; using it as configured");
    }

    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(0.7);
    validate_range_f32("temperature", "expected 0.0..=2.0", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(60)),
        dimensions: None,
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
/// - `dimensions = Some(384)`, or `None` for Ollama unless `EMBEDDING_DIM` is set
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for Anthropic (no embeddings API) or unknown values
/// - [`ConfigError::MissingVar`] if the provider's API key is absent
pub fn config_embedding_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env("EMBEDDING_PROVIDER")?;
    if provider == LlmProvider::Anthropic {
        return Err(ConfigError::UnsupportedProvider(
            "anthropic (no embeddings API)".to_string(),
        )
        .into());
    }
    let (endpoint, api_key) = endpoint_and_key(provider)?;

    let model = match opt_env("EMBEDDING_MODEL") {
        Some(m) => m,
        None => match provider {
            LlmProvider::OpenAI => "text-embedding-3-small".to_string(),
            LlmProvider::Gemini => "text-embedding-004".to_string(),
            _ => must_env("EMBEDDING_MODEL")?,
        },
    };
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
        dimensions: embedding_dimensions(provider, env_opt_u32("EMBEDDING_DIM")?),
    })
}

/// Ollama cannot truncate vectors, so only an explicit size is enforced there.
fn embedding_dimensions(provider: LlmProvider, requested: Option<u32>) -> Option<u32> {
    match (provider, requested) {
        (_, Some(dim)) => Some(dim),
        (LlmProvider::Ollama, None) => None,
        (_, None) => Some(DEFAULT_EMBEDDING_DIM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_embeddings_keep_native_size_by_default() {
        assert_eq!(embedding_dimensions(LlmProvider::Ollama, None), None);
        assert_eq!(embedding_dimensions(LlmProvider::Ollama, Some(768)), Some(768));
        assert_eq!(embedding_dimensions(LlmProvider::OpenAI, None), Some(DEFAULT_EMBEDDING_DIM));
        assert_eq!(embedding_dimensions(LlmProvider::Gemini, Some(256)), Some(256));
    }
}
