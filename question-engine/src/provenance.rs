//! Provenance reporter: observational only, never alters the batch.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::api_types::{QuestionBatch, RetrievalContext, RetrievalMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkScore {
    pub source_file: String,
    pub page: Option<u32>,
    pub score: f32,
}

/// What one request was grounded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceSummary {
    pub grounded: bool,
    pub retrieval: RetrievalMode,
    /// Distinct files of the chunks sent to the model.
    pub source_files: BTreeSet<String>,
    pub chunk_scores: Vec<ChunkScore>,
    pub question_count: usize,
}

/// Emit one `info` event for the request and a `debug` event per chunk.
pub fn report(ctx: &RetrievalContext, batch: &QuestionBatch) -> ProvenanceSummary {
    let chunk_scores: Vec<ChunkScore> = ctx
        .chunks()
        .iter()
        .map(|c| ChunkScore {
            source_file: c.source_file.clone(),
            page: c.page,
            score: c.relevance_score,
        })
        .collect();

    let summary = ProvenanceSummary {
        grounded: ctx.using_rag(),
        retrieval: ctx.retrieval(),
        source_files: ctx.source_files_used().clone(),
        chunk_scores,
        question_count: batch.actual_count(),
    };

    info!(
        subject = %ctx.subject(),
        query = %ctx.query(),
        grounded = summary.grounded,
        retrieval = ?summary.retrieval,
        source_files = ?summary.source_files,
        chunks = summary.chunk_scores.len(),
        top_score = ctx.top_score().unwrap_or_default(),
        questions = summary.question_count,
        retried = batch.repair().retried,
        padded = batch.repair().padded,
        trimmed = batch.repair().trimmed,
        "question batch provenance"
    );
    for (rank, c) in summary.chunk_scores.iter().enumerate() {
        debug!(rank, source = %c.source_file, page = ?c.page, score = c.score, "retrieved chunk");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::{ContentChunk, GeneratedQuestion, Provenance, RepairSummary};

    #[test]
    fn summary_mirrors_context() {
        let chunks = ["a.pdf", "b.pdf", "a.pdf"]
            .iter()
            .zip([0.9f32, 0.8, 0.75])
            .map(|(f, s)| ContentChunk {
                text: "t".into(),
                source_file: f.to_string(),
                subject: Some("physics".into()),
                page: Some(1),
                relevance_score: s,
            })
            .collect();
        let ctx = RetrievalContext::new(
            "Physics",
            "physics",
            "q".into(),
            chunks,
            RetrievalMode::Filtered,
            &[],
        );
        let q = GeneratedQuestion {
            id: "1".into(),
            text: "t".into(),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: "e".into(),
        };
        let batch = QuestionBatch::seal(
            vec![q],
            Provenance::from_context(&ctx),
            RepairSummary::default(),
        );

        let s = report(&ctx, &batch);
        assert!(s.grounded);
        assert_eq!(s.source_files.len(), 2);
        assert_eq!(s.chunk_scores.len(), 3);
        assert_eq!(s.chunk_scores[0].score, 0.9);
        assert_eq!(s.question_count, 1);
        assert_eq!(batch.provenance().source_files, s.source_files);
    }
}
