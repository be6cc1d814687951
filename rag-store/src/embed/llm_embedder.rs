//! Embedding provider backed by the shared LLM service's embedding profile.

use std::sync::Arc;

use crate::{EmbeddingsProvider, RagError};
use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::warn;

/// Embeds queries through [`LlmServiceProfiles::embed`].
///
/// When `dim` is set, vectors of any other length are rejected so a
/// misconfigured model cannot silently query a collection of another layout.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        let dim = svc.embedding_dim();
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>
    {
        Box::pin(async move {
            let v = self
                .svc
                .embed(text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    warn!(got = v.len(), want, "embedding dimension mismatch");
                    return Err(RagError::VectorSizeMismatch { got: v.len(), want });
                }
            }
            Ok(v)
        })
    }
}
