//! Chunk store adapter: vector index hits → [`ContentChunk`]s.

use std::sync::Arc;

use rag_store::{RagError, RagFilter, RagHit, VectorIndex};
use serde_json::Value;
use tracing::{debug, trace};

use crate::api_types::ContentChunk;

/// Fallback `sourceFile` for points stored without a `source` key.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Wraps a [`VectorIndex`] and normalizes what it returns.
#[derive(Clone)]
pub struct ChunkStore {
    index: Arc<dyn VectorIndex>,
}

impl ChunkStore {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Top-K chunks for `vector`, ordered by descending relevance.
    ///
    /// Hits without text are dropped; scores are clamped into `[0, 1]`.
    ///
    /// # Errors
    /// Propagates the index error unchanged so the planner can decide on fallback.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<&RagFilter>,
    ) -> Result<Vec<ContentChunk>, RagError> {
        let hits = self.index.search(vector, top_k, filter).await?;
        let total = hits.len();

        let mut chunks: Vec<ContentChunk> = hits.into_iter().filter_map(chunk_from_hit).collect();
        chunks.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        debug!(hits = total, kept = chunks.len(), "chunk store query mapped");
        Ok(chunks)
    }
}

/// Maps one hit. Returns `None` when the hit carries no usable text.
pub fn chunk_from_hit(hit: RagHit) -> Option<ContentChunk> {
    if hit.text.trim().is_empty() {
        trace!(source = ?hit.source, "dropping hit without text");
        return None;
    }
    let subject = hit
        .payload
        .get("subject")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let page = hit.payload.get("page").and_then(page_number);

    Some(ContentChunk {
        source_file: hit
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        subject,
        page,
        relevance_score: clamp_score(hit.score),
        text: hit.text,
    })
}

fn clamp_score(s: f32) -> f32 {
    if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) }
}

/// Page numbers arrive as integers, floats (`3.0`) or strings (`"3"`).
fn page_number(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(score: f32, payload: Value) -> RagHit {
        RagHit::from_payload(score, payload)
    }

    #[test]
    fn maps_metadata_and_clamps_scores() {
        let c = chunk_from_hit(hit(
            1.3,
            json!({"text": "Ohm's law", "source": "elec.pdf", "subject": "physics", "page": 4.0}),
        ))
        .unwrap();
        assert_eq!(c.source_file, "elec.pdf");
        assert_eq!(c.subject.as_deref(), Some("physics"));
        assert_eq!(c.page, Some(4));
        assert_eq!(c.relevance_score, 1.0);

        let c = chunk_from_hit(hit(f32::NAN, json!({"text": "x", "page": "12"}))).unwrap();
        assert_eq!(c.relevance_score, 0.0);
        assert_eq!(c.page, Some(12));
        assert_eq!(c.source_file, UNKNOWN_SOURCE);
    }

    #[test]
    fn drops_textless_hits_and_odd_pages() {
        assert!(chunk_from_hit(hit(0.9, json!({"text": "   "}))).is_none());
        let c = chunk_from_hit(hit(0.5, json!({"text": "x", "page": -2}))).unwrap();
        assert_eq!(c.page, None);
        let c = chunk_from_hit(hit(0.5, json!({"text": "x", "page": 2.5}))).unwrap();
        assert_eq!(c.page, None);
    }

    #[tokio::test]
    async fn query_orders_by_descending_score() {
        use crate::testing::{InMemoryIndex, chunk_hit};

        let index = InMemoryIndex::new(vec![
            chunk_hit("b", "b.pdf", Some("physics"), 0.2),
            chunk_hit("a", "a.pdf", Some("physics"), 0.9),
            chunk_hit("", "empty.pdf", Some("physics"), 0.95),
        ])
        .unordered();
        let store = ChunkStore::new(Arc::new(index));
        let chunks = store.query(vec![0.0; 3], 10, None).await.unwrap();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
    }
}
