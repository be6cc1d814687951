//! Retrieval planner: query text, subject filter, and the unfiltered fallback.

use std::sync::Arc;

use rag_store::{EmbeddingsProvider, RagFilter};
use tracing::{info, warn};

use crate::api_types::{
    Difficulty, RetrievalContext, RetrievalMode, RetrievalRequest, normalize_subject,
};
use crate::error::RetrievalError;
use crate::store::ChunkStore;

/// Payload key holding the document subject tag.
pub const SUBJECT_FIELD: &str = "subject";

/// Semantic query embedding both difficulty and subject.
pub fn build_query(subject: &str, difficulty: Difficulty) -> String {
    format!("{difficulty} level concepts, problems, and theory in {subject}")
}

pub struct RetrievalPlanner {
    embedder: Arc<dyn EmbeddingsProvider>,
    store: ChunkStore,
    top_k: u64,
    shared_tags: Vec<String>,
}

impl RetrievalPlanner {
    pub fn new(
        embedder: Arc<dyn EmbeddingsProvider>,
        store: ChunkStore,
        top_k: u64,
        shared_tags: Vec<String>,
    ) -> Self {
        let shared_tags = shared_tags.iter().map(|t| normalize_subject(t)).collect();
        Self {
            embedder,
            store,
            top_k,
            shared_tags,
        }
    }

    /// Subject filter: any-of `{subject} ∪ shared tags`.
    pub fn subject_filter(&self, subject_key: &str) -> RagFilter {
        RagFilter::field_in(
            SUBJECT_FIELD,
            std::iter::once(subject_key).chain(self.shared_tags.iter().map(String::as_str)),
        )
    }

    /// Retrieves chunks for the request.
    ///
    /// If the store fails on the filtered query it is retried once without a
    /// filter and the context is marked [`RetrievalMode::UnfilteredFallback`].
    /// Zero matches is not a failure and never triggers the fallback.
    ///
    /// # Errors
    /// - [`RetrievalError::Embedding`] if the query cannot be embedded
    /// - [`RetrievalError::Store`] if the unfiltered retry fails as well
    pub async fn plan(&self, req: &RetrievalRequest) -> Result<RetrievalContext, RetrievalError> {
        let subject_key = normalize_subject(&req.subject);
        let query = build_query(&req.subject, req.difficulty);

        let vector = self
            .embedder
            .embed(&query)
            .await
            .map_err(RetrievalError::Embedding)?;

        let filter = self.subject_filter(&subject_key);
        let (chunks, mode) = match self
            .store
            .query(vector.clone(), self.top_k, Some(&filter))
            .await
        {
            Ok(chunks) => (chunks, RetrievalMode::Filtered),
            Err(e) => {
                warn!(
                    subject = %subject_key,
                    error = %e,
                    "filtered retrieval rejected by store; retrying unfiltered (lower confidence)"
                );
                let chunks = self
                    .store
                    .query(vector, self.top_k, None)
                    .await
                    .map_err(RetrievalError::Store)?;
                (chunks, RetrievalMode::UnfilteredFallback)
            }
        };

        info!(
            query = %query,
            filter = ?filter.any_of,
            retrieval = ?mode,
            matches = chunks.len(),
            "retrieval planned"
        );

        Ok(RetrievalContext::new(
            &req.subject,
            &subject_key,
            query,
            chunks,
            mode,
            &self.shared_tags,
        ))
    }
}
