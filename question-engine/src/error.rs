//! Typed errors for the question engine.
//!
//! Only [`QuestionEngineError`] reaches callers. Everything else is either
//! recovered inside the pipeline (filtered-store failures, retry-call
//! failures) or wrapped into a [`GenerationFailure`] that records the stage.

use std::fmt;
use std::time::Duration;

use ai_llm_service::error_handler::AiLlmError;
use rag_store::RagError;
use thiserror::Error;

use crate::api_types::Difficulty;

/// The model output could not be turned into questions.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No JSON array of question objects was found in the output.
    #[error("no well-formed JSON array of questions in model output: {0}")]
    MalformedJson(String),

    /// An array was found but an element violates the question schema.
    #[error("question #{index} is invalid: {reason}")]
    InvalidSchema { index: usize, reason: String },
}

/// The completion model call failed.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion provider failed: {0}")]
    Provider(#[from] AiLlmError),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
}

/// Retrieval failed before any chunk could be considered.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[source] RagError),

    /// Both the filtered query and the unfiltered fallback failed.
    #[error("chunk store query failed: {0}")]
    Store(#[source] RagError),
}

/// Pipeline stage a [`GenerationFailure`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    Completion,
    Parse,
    Reconcile,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Retrieval => "retrieval",
            Stage::Completion => "completion",
            Stage::Parse => "parse",
            Stage::Reconcile => "reconcile",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason of a [`GenerationFailure`].
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Every model answer parsed to an empty array; there is nothing to pad from.
    #[error("model returned no questions after {attempts} attempt(s)")]
    EmptyBatch { attempts: u32 },
}

/// Source material existed (or could not be read) but no valid batch was produced.
#[derive(Debug, Error)]
#[error("generation failed at {stage} for subject={subject:?} difficulty={difficulty} count={count}: {cause}")]
pub struct GenerationFailure {
    pub stage: Stage,
    pub subject: String,
    pub difficulty: Difficulty,
    pub count: usize,
    #[source]
    pub cause: FailureCause,
}

/// Caller supplied a request that violates the preconditions.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("subject must not be empty")]
    EmptySubject,

    #[error("count must be between 1 and {max}, got {count}")]
    CountOutOfRange { count: usize, max: usize },

    #[error("unknown difficulty {0:?}; expected easy, medium or hard")]
    InvalidDifficulty(String),
}

/// Invalid [`crate::GenerationConfig`] value.
#[derive(Debug, Error)]
#[error("invalid generation config: {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

/// Error returned by [`crate::QuestionEngine::generate_questions`].
#[derive(Debug, Error)]
pub enum QuestionEngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error(transparent)]
    Generation(#[from] Box<GenerationFailure>),
}
