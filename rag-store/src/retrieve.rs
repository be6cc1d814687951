//! Vector search mapped into [`RagHit`]s.

use crate::config::RagConfig;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::QdrantFacade;
use crate::record::{RagFilter, RagHit};

use tracing::trace;

/// Searches with a ready query vector and maps payloads into [`RagHit`]s.
///
/// # Errors
/// Returns `RagError::Qdrant` on client failures.
pub async fn search_by_vector(
    cfg: &RagConfig,
    client: &QdrantFacade,
    query_vector: Vec<f32>,
    top_k: u64,
    filter: Option<&RagFilter>,
) -> Result<Vec<RagHit>, RagError> {
    trace!(
        "retrieve::search_by_vector top_k={top_k} filtered={}",
        filter.is_some()
    );
    let hits = client
        .search(
            query_vector,
            top_k,
            filter.map(to_qdrant_filter),
            cfg.exact_search,
        )
        .await?;

    Ok(hits
        .into_iter()
        .map(|(score, payload)| RagHit::from_payload(score, payload))
        .collect())
}
