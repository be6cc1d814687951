//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+options).
//! - Dispatches to the provider named by each profile.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_embedding_from_env, config_generation_from_env};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_generation_from_env()?,
//!     config_embedding_from_env()?,
//!     Some(10),
//! )?);
//!
//! let txt = svc.generate("Say hi", None).await?;
//! let emb = svc.embed("Ferris").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{
        anthropic_service::AnthropicService, gemini_service::GeminiService,
        ollama_service::OllamaService, open_ai_service::OpenAiService,
    },
};

/// One constructed provider client.
#[derive(Debug)]
enum ProviderClient {
    OpenAI(OpenAiService),
    Gemini(GeminiService),
    Anthropic(AnthropicService),
    Ollama(OllamaService),
}

impl ProviderClient {
    fn new(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        let cfg = cfg.clone();
        Ok(match cfg.provider {
            LlmProvider::OpenAI => Self::OpenAI(OpenAiService::new(cfg)?),
            LlmProvider::Gemini => Self::Gemini(GeminiService::new(cfg)?),
            LlmProvider::Anthropic => Self::Anthropic(AnthropicService::new(cfg)?),
            LlmProvider::Ollama => Self::Ollama(OllamaService::new(cfg)?),
        })
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match self {
            Self::OpenAI(c) => c.generate(prompt, system).await,
            Self::Gemini(c) => c.generate(prompt, system).await,
            Self::Anthropic(c) => c.generate(prompt, system).await,
            Self::Ollama(c) => c.generate(prompt, system).await,
        }
    }

    async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self {
            Self::OpenAI(c) => c.embeddings(input).await,
            Self::Gemini(c) => c.embeddings(input).await,
            Self::Anthropic(c) => c.embeddings(input).await,
            Self::Ollama(c) => c.embeddings(input).await,
        }
    }
}

/// Shared service that manages the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,
    clients: RwLock<HashMap<ClientKey, Arc<ProviderClient>>>,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// Clients are created lazily on first use, so a misconfigured profile
    /// surfaces as an error from the first call rather than here.
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            generation,
            embedding,
            clients: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let cli = self.get_or_init(&self.generation).await?;
        cli.generate(prompt, system).await
    }

    /// Computes embeddings using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cli = self.get_or_init(&self.embedding).await?;
        cli.embeddings(input).await
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.generation.clone()];
        if ClientKey::from(&self.embedding).target() != ClientKey::from(&self.generation).target() {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Expected embedding dimensionality, when configured.
    pub fn embedding_dim(&self) -> Option<usize> {
        self.embedding.dimensions.map(|d| d as usize)
    }

    async fn get_or_init(&self, cfg: &LlmModelConfig) -> Result<Arc<ProviderClient>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(provider = %cfg.provider, model = %cfg.model, "creating provider client");
        let cli = Arc::new(ProviderClient::new(cfg)?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
///
/// Floats are keyed by their bit pattern so the key can derive `Hash`.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<u32>,
    top_p: Option<u32>,
    dimensions: Option<u32>,
}

impl ClientKey {
    /// The part of the key that identifies a remote model (ignores sampling options).
    fn target(&self) -> (LlmProvider, &str, &str) {
        (self.provider, &self.endpoint, &self.model)
    }
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature.map(f32::to_bits),
            top_p: cfg.top_p.map(f32::to_bits),
            dimensions: cfg.dimensions,
        }
    }
}
