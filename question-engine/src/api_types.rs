//! Request, context and result types shared across the pipeline.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Question difficulty requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// What questions of this level should exercise; embedded in prompts.
    pub fn guidelines(&self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => &[
                "Focus on recall, definitions, basic concepts and direct facts from the context.",
                "Test recognition and understanding of fundamental principles.",
                "Use straightforward language and simple scenarios.",
            ],
            Difficulty::Medium => &[
                "Require application of concepts, calculations and problem-solving.",
                "Combine multiple concepts from the context.",
                "Include numerical problems and conceptual applications.",
            ],
            Difficulty::Hard => &[
                "Demand analysis, synthesis and deep understanding.",
                "Create multi-step problems requiring integration of concepts.",
                "Include edge cases, derivations and complex scenarios.",
            ],
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(RequestError::InvalidDifficulty(other.to_string())),
        }
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    /// Subject as given by the caller, trimmed.
    pub subject: String,
    pub difficulty: Difficulty,
    pub requested_count: usize,
}

impl RetrievalRequest {
    /// Checks the preconditions: non-blank subject and `1 <= count <= max_count`.
    pub fn new(
        subject: &str,
        difficulty: Difficulty,
        count: usize,
        max_count: usize,
    ) -> Result<Self, RequestError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(RequestError::EmptySubject);
        }
        if count == 0 || count > max_count {
            return Err(RequestError::CountOutOfRange {
                count,
                max: max_count,
            });
        }
        Ok(Self {
            subject: subject.to_string(),
            difficulty,
            requested_count: count,
        })
    }
}

/// One retrieved span of source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub text: String,
    pub source_file: String,
    pub subject: Option<String>,
    pub page: Option<u32>,
    /// Similarity in `[0, 1]`.
    pub relevance_score: f32,
}

/// How the chunks were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// The subject filter was applied by the store.
    Filtered,
    /// The store rejected the filtered query; results are unfiltered.
    UnfilteredFallback,
}

/// Chunks retrieved for one request plus what was derived from them.
///
/// Built once by the planner; read-only afterwards.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    subject: String,
    subject_key: String,
    query: String,
    chunks: Vec<ContentChunk>,
    retrieval: RetrievalMode,
    using_rag: bool,
    source_files_used: BTreeSet<String>,
}

impl RetrievalContext {
    /// `chunks` must already be ordered by descending score.
    ///
    /// A chunk is subject-relevant when it has no subject tag, or its tag
    /// normalizes to `subject_key` or to one of `shared_tags`. Chunks tagged
    /// with another subject are dropped, so they never reach the prompt or
    /// the provenance.
    pub fn new(
        subject: &str,
        subject_key: &str,
        query: String,
        chunks: Vec<ContentChunk>,
        retrieval: RetrievalMode,
        shared_tags: &[String],
    ) -> Self {
        let chunks: Vec<ContentChunk> = chunks
            .into_iter()
            .filter(|c| match c.subject.as_deref() {
                None => true,
                Some(tag) => {
                    let tag = normalize_subject(tag);
                    tag == subject_key || shared_tags.iter().any(|s| normalize_subject(s) == tag)
                }
            })
            .collect();
        let using_rag = !chunks.is_empty();
        let source_files_used = chunks.iter().map(|c| c.source_file.clone()).collect();

        Self {
            subject: subject.to_string(),
            subject_key: subject_key.to_string(),
            query,
            chunks,
            retrieval,
            using_rag,
            source_files_used,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn subject_key(&self) -> &str {
        &self.subject_key
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn chunks(&self) -> &[ContentChunk] {
        &self.chunks
    }

    pub fn retrieval(&self) -> RetrievalMode {
        self.retrieval
    }

    pub fn using_rag(&self) -> bool {
        self.using_rag
    }

    pub fn source_files_used(&self) -> &BTreeSet<String> {
        &self.source_files_used
    }

    pub fn top_score(&self) -> Option<f32> {
        self.chunks.first().map(|c| c.relevance_score)
    }
}

/// Lowercase, trimmed, single-spaced form used for filtering and comparison.
pub fn normalize_subject(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub id: String,
    pub text: String,
    pub options: [String; 4],
    /// Index into `options`, always `0..=3`.
    pub correct_answer: u8,
    pub explanation: String,
}

/// Where a sealed batch came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub grounded: bool,
    /// `unfiltered_fallback` marks a lower-confidence batch.
    pub retrieval: RetrievalMode,
    pub source_files: BTreeSet<String>,
}

impl Provenance {
    pub fn from_context(ctx: &RetrievalContext) -> Self {
        Self {
            grounded: ctx.using_rag(),
            retrieval: ctx.retrieval(),
            source_files: ctx.source_files_used().clone(),
        }
    }
}

/// What the count reconciler had to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    /// Model calls made, including the initial one.
    pub attempts: u32,
    pub retried: bool,
    /// Questions added by cyclic duplication.
    pub padded: usize,
    /// Questions dropped from the tail.
    pub trimmed: usize,
}

/// A sealed batch: `actual_count == requested_count` and ids are `1..=N`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBatch {
    questions: Vec<GeneratedQuestion>,
    requested_count: usize,
    actual_count: usize,
    provenance: Provenance,
    repair: RepairSummary,
}

impl QuestionBatch {
    /// Seals reconciled questions. The reconciler guarantees the exact count.
    pub(crate) fn seal(
        questions: Vec<GeneratedQuestion>,
        provenance: Provenance,
        repair: RepairSummary,
    ) -> Self {
        let n = questions.len();
        Self {
            questions,
            requested_count: n,
            actual_count: n,
            provenance,
            repair,
        }
    }

    pub fn questions(&self) -> &[GeneratedQuestion] {
        &self.questions
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    pub fn actual_count(&self) -> usize {
        self.actual_count
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn repair(&self) -> &RepairSummary {
        &self.repair
    }
}

/// Reserved id that marks a [`NoContentResult`] question.
pub const NO_CONTENT_ID: &str = "no-content";

/// Why the grounding gate declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateReason {
    NoContentForSubject,
}

/// Graceful decline when no source material exists for the subject.
///
/// Shaped like a single question so clients that render questions can show
/// the message without special casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoContentResult {
    pub reason: GateReason,
    pub message: String,
    pub question: GeneratedQuestion,
}

impl NoContentResult {
    pub fn for_subject(subject: &str, reason: GateReason) -> Self {
        let message = format!(
            "No study material has been uploaded for {subject} yet. \
             Upload documents for this subject to generate questions from them."
        );
        Self {
            reason,
            question: GeneratedQuestion {
                id: NO_CONTENT_ID.to_string(),
                text: message.clone(),
                options: [
                    "Upload documents".to_string(),
                    "Choose another subject".to_string(),
                    "Try again later".to_string(),
                    "Contact support".to_string(),
                ],
                correct_answer: 0,
                explanation: "Questions are generated only from uploaded documents.".to_string(),
            },
            message,
        }
    }
}

/// Result of a successful call: a sealed batch or a graceful decline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Batch(QuestionBatch),
    NoContent(NoContentResult),
}
