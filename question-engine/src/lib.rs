//! Retrieval-augmented multiple-choice question generation.
//!
//! [`QuestionEngine::generate_questions`] turns `(subject, difficulty, count)`
//! into exactly `count` questions grounded in previously ingested documents,
//! or a [`NoContentResult`] when nothing was found for the subject. The
//! completion model is never asked to answer from its own knowledge.

pub mod api_types;
pub mod cfg;
pub mod error;
pub mod gate;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod planner;
pub mod prompt;
pub mod provenance;
mod reconcile;
pub mod store;

#[cfg(test)]
mod testing;

pub use api_types::{
    ContentChunk, Difficulty, GeneratedQuestion, GenerationOutcome, NoContentResult, Provenance,
    QuestionBatch, RepairSummary, RetrievalContext, RetrievalMode,
};
pub use cfg::GenerationConfig;
pub use error::{GenerationFailure, QuestionEngineError, RequestError, Stage};
pub use llm::{CompletionProvider, LlmCompletionClient};
pub use pipeline::QuestionEngine;
