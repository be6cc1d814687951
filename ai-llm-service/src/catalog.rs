//! Static catalog of known chat models per provider.
//!
//! Used to pick a default model when `LLM_MODEL` is unset, to warn about
//! unknown model identifiers at startup, and to back the `/models` listing.
//! Unknown models are never rejected: providers ship new models faster than
//! this table changes.

use serde::Serialize;

use crate::config::llm_provider::LlmProvider;

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Catalog view for a single provider, as exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderModels {
    pub provider: LlmProvider,
    /// `true` when the provider's API key env var is set (always `true` for Ollama).
    pub api_key_configured: bool,
    pub default_model: &'static str,
    pub models: &'static [ModelInfo],
}

const OPENAI: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4",
        name: "GPT-4",
        description: "Most capable OpenAI model",
    },
    ModelInfo {
        id: "gpt-4o",
        name: "GPT-4o",
        description: "Optimized GPT-4 model",
    },
    ModelInfo {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        description: "Fast and cost-effective",
    },
    ModelInfo {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        description: "Fast and economical",
    },
];

const GEMINI: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-pro",
        name: "Gemini Pro",
        description: "Google's advanced model",
    },
    ModelInfo {
        id: "gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
        description: "Latest Gemini model",
    },
    ModelInfo {
        id: "gemini-1.5-flash",
        name: "Gemini 1.5 Flash",
        description: "Fast Gemini model",
    },
];

const ANTHROPIC: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-3-opus-20240229",
        name: "Claude 3 Opus",
        description: "Most capable Claude model",
    },
    ModelInfo {
        id: "claude-3-sonnet-20240229",
        name: "Claude 3 Sonnet",
        description: "Balanced performance",
    },
    ModelInfo {
        id: "claude-3-haiku-20240307",
        name: "Claude 3 Haiku",
        description: "Fast and compact",
    },
];

const OLLAMA: &[ModelInfo] = &[ModelInfo {
    id: "llama3.1:8b",
    name: "Llama 3.1 8B",
    description: "Local general-purpose model",
}];

/// Known models for a provider.
pub fn models_for(provider: LlmProvider) -> &'static [ModelInfo] {
    match provider {
        LlmProvider::OpenAI => OPENAI,
        LlmProvider::Gemini => GEMINI,
        LlmProvider::Anthropic => ANTHROPIC,
        LlmProvider::Ollama => OLLAMA,
    }
}

/// Default chat model used when none is configured.
pub fn default_model(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAI => "gpt-4o-mini",
        LlmProvider::Gemini => "gemini-1.5-flash",
        LlmProvider::Anthropic => "claude-3-haiku-20240307",
        LlmProvider::Ollama => "llama3.1:8b",
    }
}

/// Returns `true` if `model` is listed for `provider`.
pub fn is_known_model(provider: LlmProvider, model: &str) -> bool {
    models_for(provider).iter().any(|m| m.id == model)
}

/// Full catalog, checking which providers have credentials in the environment.
pub fn list_available() -> Vec<ProviderModels> {
    LlmProvider::ALL
        .iter()
        .map(|&provider| ProviderModels {
            provider,
            api_key_configured: provider
                .api_key_var()
                .map(|var| crate::error_handler::opt_env(var).is_some())
                .unwrap_or(true),
            default_model: default_model(provider),
            models: models_for(provider),
        })
        .collect()
}
