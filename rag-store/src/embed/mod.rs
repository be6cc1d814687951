use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Provider interface for query embedding.
///
/// Async because real providers (OpenAI, Gemini, Ollama) perform HTTP requests.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod llm_embedder;
