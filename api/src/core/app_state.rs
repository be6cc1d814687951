use std::sync::Arc;

use ai_llm_service::{
    config::default_config::{config_embedding_from_env, config_generation_from_env},
    service_profiles::LlmServiceProfiles,
};
use question_engine::{GenerationConfig, LlmCompletionClient, QuestionEngine};
use rag_store::{LlmEmbedder, RagConfig, RagStore};
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Question generation pipeline.
    pub engine: Arc<QuestionEngine>,
    /// Generation + embedding profiles (also used for health probes).
    pub llm: Arc<LlmServiceProfiles>,
    /// Qdrant-backed chunk store.
    pub store: Arc<RagStore>,
}

impl AppState {
    /// Build every collaborator from environment variables.
    ///
    /// # Errors
    /// [`AppError::Config`] if any profile or store setting is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        let generation = config_generation_from_env().map_err(AppError::config)?;
        let embedding = config_embedding_from_env().map_err(AppError::config)?;
        info!(
            generation = %format!("{:?}/{}", generation.provider, generation.model),
            embedding = %format!("{:?}/{}", embedding.provider, embedding.model),
            "llm profiles loaded"
        );

        let health_timeout = std::env::var("HEALTH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok());
        let llm = Arc::new(
            LlmServiceProfiles::new(generation, embedding, health_timeout)
                .map_err(AppError::config)?,
        );

        let rag_cfg = RagConfig::from_env().map_err(AppError::config)?;
        info!(url = %rag_cfg.qdrant_url, collection = %rag_cfg.collection, "chunk store configured");
        let store = Arc::new(RagStore::new(rag_cfg).map_err(AppError::config)?);

        let gen_cfg = GenerationConfig::from_env().map_err(AppError::config)?;
        let engine = QuestionEngine::new(
            gen_cfg,
            Arc::new(LlmEmbedder::new(llm.clone())),
            store.clone(),
            Arc::new(LlmCompletionClient::new(llm.clone())),
        )
        .map_err(AppError::config)?;

        Ok(Self {
            engine: Arc::new(engine),
            llm,
            store,
        })
    }
}
