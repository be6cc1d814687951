//! Read-only retrieval facade over a Qdrant collection of document chunks.
//!
//! The collection is populated by the document ingestion pipeline; this
//! crate only searches it:
//! - Vector search with an optional any-of payload filter
//! - Query embedding through an [`EmbeddingsProvider`]
//! - The [`VectorIndex`] seam consumed by the question engine

mod config;
mod embed;
mod errors;
mod filters;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::{DEFAULT_COLLECTION, RagConfig};
pub use embed::EmbeddingsProvider;
pub use embed::llm_embedder::LlmEmbedder;
pub use errors::RagError;
pub use record::{RagFilter, RagHit};

use std::{future::Future, pin::Pin};

use tracing::trace;

/// Nearest-neighbor search over stored chunks.
///
/// Implemented by [`RagStore`]; in-memory implementations back tests.
pub trait VectorIndex: Send + Sync {
    fn search<'a>(
        &'a self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<&'a RagFilter>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RagHit>, RagError>> + Send + 'a>>;
}

/// High-level facade that wires configuration and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` if validation or client initialization fails.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Performs a vector search and returns hits with payloads.
    ///
    /// # Errors
    /// Returns `RagError::Qdrant` if search fails.
    pub async fn search_by_vector(
        &self,
        query_vector: Vec<f32>,
        top_k: u64,
        filter: Option<&RagFilter>,
    ) -> Result<Vec<RagHit>, RagError> {
        trace!("RagStore::search_by_vector top_k={top_k}");
        retrieve::search_by_vector(&self.cfg, &self.client, query_vector, top_k, filter).await
    }

    /// Qdrant server version if reachable.
    pub async fn health(&self) -> Result<String, RagError> {
        self.client.health().await
    }
}

impl VectorIndex for RagStore {
    fn search<'a>(
        &'a self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<&'a RagFilter>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RagHit>, RagError>> + Send + 'a>> {
        Box::pin(self.search_by_vector(vector, top_k, filter))
    }
}
