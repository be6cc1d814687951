//! End-to-end question generation.
//!
//! One call runs sequentially: plan → gate → (decline) or compose → complete
//! → parse → reconcile → seal → report. Nothing is shared between calls
//! except the immutable collaborators held by [`QuestionEngine`].

use std::sync::Arc;

use rag_store::{EmbeddingsProvider, VectorIndex};
use tracing::{error, info, instrument};

use crate::api_types::{
    Difficulty, GateReason, GenerationOutcome, NoContentResult, Provenance, QuestionBatch,
    RetrievalRequest,
};
use crate::cfg::GenerationConfig;
use crate::error::{ConfigError, FailureCause, GenerationFailure, QuestionEngineError, Stage};
use crate::gate::GroundingGate;
use crate::llm::{CompletionAdapter, CompletionProvider};
use crate::parse::parse;
use crate::planner::RetrievalPlanner;
use crate::prompt::{Attempt, compose};
use crate::provenance;
use crate::reconcile::{RetryError, reconcile};
use crate::store::ChunkStore;

pub struct QuestionEngine {
    cfg: GenerationConfig,
    planner: RetrievalPlanner,
    gate: GroundingGate,
    completion: CompletionAdapter,
}

impl QuestionEngine {
    /// # Errors
    /// Returns [`ConfigError`] if `cfg` does not validate.
    pub fn new(
        cfg: GenerationConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
        index: Arc<dyn VectorIndex>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let planner = RetrievalPlanner::new(
            embedder,
            ChunkStore::new(index),
            cfg.top_k,
            cfg.shared_subject_tags.clone(),
        );
        Ok(Self {
            gate: GroundingGate::new(cfg.relevance_floor),
            completion: CompletionAdapter::new(completion, cfg.completion_timeout),
            planner,
            cfg,
        })
    }

    /// Generate exactly `count` questions about `subject` from stored material.
    ///
    /// Returns [`GenerationOutcome::NoContent`] when nothing usable was
    /// retrieved; the completion model is not called in that case.
    ///
    /// # Errors
    /// - [`QuestionEngineError::InvalidRequest`] on blank subject or count out of range
    /// - [`QuestionEngineError::Generation`] when material existed but no batch could be produced
    #[instrument(skip_all, fields(subject = %subject, difficulty = %difficulty, count = count))]
    pub async fn generate_questions(
        &self,
        subject: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<GenerationOutcome, QuestionEngineError> {
        let req = RetrievalRequest::new(subject, difficulty, count, self.cfg.max_questions)?;
        let fail = |stage: Stage, cause: FailureCause| failure(&req, stage, cause);

        let ctx = self
            .planner
            .plan(&req)
            .await
            .map_err(|e| fail(Stage::Retrieval, e.into()))?;

        let decision = self.gate.decide(&ctx);
        if !decision.proceed {
            let reason = decision.reason.unwrap_or(GateReason::NoContentForSubject);
            info!(
                subject = %req.subject,
                retrieved = ctx.chunks().len(),
                retrieval = ?ctx.retrieval(),
                "no grounding material; declining without calling the model"
            );
            return Ok(GenerationOutcome::NoContent(NoContentResult::for_subject(
                &req.subject,
                reason,
            )));
        }

        let prompt = compose(&ctx, difficulty, count, Attempt::Initial);
        let raw = self
            .completion
            .complete(&prompt)
            .await
            .map_err(|e| fail(Stage::Completion, e.into()))?;
        let initial = parse(&raw).map_err(|e| fail(Stage::Parse, e.into()))?;

        let (questions, repair) = reconcile(initial, count, self.cfg.retry_limit, |actual| {
            let prompt = compose(&ctx, difficulty, count, Attempt::Retry { actual });
            async move {
                let raw = self.completion.complete(&prompt).await?;
                Ok::<_, RetryError>(parse(&raw)?)
            }
        })
        .await
        .map_err(|e| fail(Stage::Reconcile, e))?;

        let batch = QuestionBatch::seal(questions, Provenance::from_context(&ctx), repair);
        provenance::report(&ctx, &batch);
        Ok(GenerationOutcome::Batch(batch))
    }
}

fn failure(req: &RetrievalRequest, stage: Stage, cause: FailureCause) -> QuestionEngineError {
    error!(
        subject = %req.subject,
        difficulty = %req.difficulty,
        count = req.requested_count,
        stage = %stage,
        error = %cause,
        "question generation failed"
    );
    QuestionEngineError::Generation(Box::new(GenerationFailure {
        stage,
        subject: req.subject.clone(),
        difficulty: req.difficulty,
        count: req.requested_count,
        cause,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::{GeneratedQuestion, NO_CONTENT_ID, RetrievalMode};
    use crate::error::{CompletionError, ParseError, RequestError};
    use crate::testing::{FixedEmbedder, InMemoryIndex, ScriptedCompletion, chunk_hit, questions_json};
    use std::collections::HashSet;
    use std::time::Duration;

    fn physics_index() -> InMemoryIndex {
        InMemoryIndex::new(vec![
            chunk_hit("Newton's first law ...", "mechanics.pdf", Some("physics"), 0.91),
            chunk_hit("Work equals force times displacement ...", "energy.pdf", Some("physics"), 0.84),
            chunk_hit("Momentum is conserved ...", "mechanics.pdf", Some("physics"), 0.77),
            chunk_hit("Benzene ring ...", "organic.pdf", Some("chemistry"), 0.95),
        ])
    }

    fn chemistry_index() -> InMemoryIndex {
        InMemoryIndex::new(vec![
            chunk_hit("Covalent bonds share electrons ...", "bonds.pdf", Some("chemistry"), 0.88),
            chunk_hit("Periodic trends ...", "mixed_paper.pdf", Some("mixed"), 0.70),
        ])
    }

    fn engine(
        index: InMemoryIndex,
        script: Vec<Result<String, CompletionError>>,
    ) -> (QuestionEngine, Arc<ScriptedCompletion>) {
        let completion = Arc::new(ScriptedCompletion::new(script));
        let engine = QuestionEngine::new(
            GenerationConfig::default(),
            Arc::new(FixedEmbedder::default()),
            Arc::new(index),
            completion.clone(),
        )
        .unwrap();
        (engine, completion)
    }

    fn batch(out: GenerationOutcome) -> QuestionBatch {
        match out {
            GenerationOutcome::Batch(b) => b,
            GenerationOutcome::NoContent(n) => panic!("expected a batch, got no-content: {}", n.message),
        }
    }

    fn generation_failure(err: QuestionEngineError) -> GenerationFailure {
        match err {
            QuestionEngineError::Generation(f) => *f,
            other => panic!("expected a generation failure, got {other}"),
        }
    }

    fn assert_sealed(b: &QuestionBatch, n: usize) {
        assert_eq!(b.requested_count(), n);
        assert_eq!(b.actual_count(), n);
        assert_eq!(b.questions().len(), n);
        let ids: Vec<String> = b.questions().iter().map(|q| q.id.clone()).collect();
        let want: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        assert_eq!(ids, want);
        for q in b.questions() {
            assert_eq!(q.options.len(), 4);
            assert!(q.correct_answer <= 3);
        }
    }

    #[tokio::test]
    async fn scenario_a_exact_batch_is_sealed_with_provenance() {
        let (engine, completion) = engine(physics_index(), vec![Ok(questions_json("phys", 5))]);
        let b = batch(
            engine
                .generate_questions("Physics", Difficulty::Medium, 5)
                .await
                .unwrap(),
        );

        assert_sealed(&b, 5);
        assert!(b.provenance().grounded);
        assert_eq!(b.provenance().retrieval, RetrievalMode::Filtered);
        let files: Vec<_> = b.provenance().source_files.iter().cloned().collect();
        assert_eq!(files, ["energy.pdf", "mechanics.pdf"]);
        assert_eq!(completion.calls(), 1);
        assert!(!b.repair().retried);

        let prompt = &completion.prompts()[0];
        assert!(prompt.contains("Newton's first law ..."));
        assert!(!prompt.contains("Benzene ring"));
    }

    #[tokio::test]
    async fn scenario_b_no_material_never_calls_the_model() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for count in [1, 5, 20] {
                let (engine, completion) = engine(physics_index(), vec![Ok(questions_json("x", 5))]);
                let out = engine
                    .generate_questions("History", difficulty, count)
                    .await
                    .unwrap();
                match out {
                    GenerationOutcome::NoContent(n) => {
                        assert_eq!(n.reason, GateReason::NoContentForSubject);
                        assert_eq!(n.question.id, NO_CONTENT_ID);
                        assert!(n.message.contains("History"));
                    }
                    GenerationOutcome::Batch(_) => panic!("history has no material"),
                }
                assert_eq!(completion.calls(), 0);
            }
        }
    }

    #[tokio::test]
    async fn empty_store_with_filter_rejection_still_declines() {
        let (engine, completion) = engine(
            InMemoryIndex::new(vec![]).reject_filtered(),
            vec![Ok(questions_json("x", 3))],
        );
        let out = engine
            .generate_questions("History", Difficulty::Easy, 3)
            .await
            .unwrap();
        assert!(matches!(out, GenerationOutcome::NoContent(_)));
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_c_retry_fixes_the_count() {
        let (engine, completion) = engine(
            chemistry_index(),
            vec![Ok(questions_json("first", 4)), Ok(questions_json("retry", 10))],
        );
        let b = batch(
            engine
                .generate_questions("Chemistry", Difficulty::Hard, 10)
                .await
                .unwrap(),
        );

        assert_sealed(&b, 10);
        assert_eq!(completion.calls(), 2);
        assert!(b.repair().retried);
        assert_eq!(b.repair().padded, 0);
        assert!(b.questions().iter().all(|q| q.text.starts_with("retry ")));

        let retry_prompt = &completion.prompts()[1];
        assert!(retry_prompt.contains("You returned 4, you must return exactly 10."));
    }

    #[tokio::test]
    async fn scenario_d_short_retry_is_padded() {
        let (engine, completion) = engine(
            chemistry_index(),
            vec![Ok(questions_json("first", 4)), Ok(questions_json("retry", 6))],
        );
        let b = batch(
            engine
                .generate_questions("Chemistry", Difficulty::Medium, 10)
                .await
                .unwrap(),
        );

        assert_sealed(&b, 10);
        assert_eq!(completion.calls(), 2);
        assert_eq!(b.repair().padded, 4);

        let head: Vec<&GeneratedQuestion> = b.questions()[..6].iter().collect();
        for q in &b.questions()[6..] {
            assert!(
                head.iter()
                    .any(|h| h.text == q.text && h.options == q.options),
                "{} is not a duplicate of questions 1-6",
                q.text
            );
        }
    }

    #[tokio::test]
    async fn scenario_e_unparseable_initial_output_fails_without_retry() {
        let (engine, completion) = engine(
            physics_index(),
            vec![
                Ok("Sorry, I can only answer in prose.".into()),
                Ok(questions_json("never", 5)),
            ],
        );
        let err = engine
            .generate_questions("Physics", Difficulty::Easy, 5)
            .await
            .unwrap_err();
        let f = generation_failure(err);

        assert_eq!(f.stage, Stage::Parse);
        assert!(matches!(f.cause, FailureCause::Parse(ParseError::MalformedJson(_))));
        assert_eq!(f.subject, "Physics");
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn count_invariant_holds_for_common_sizes() {
        for n in [1usize, 5, 10, 20] {
            for returned in [1usize, n, n + 3] {
                let (engine, _) = engine(
                    physics_index(),
                    vec![
                        Ok(questions_json("a", returned)),
                        Ok(questions_json("b", returned)),
                    ],
                );
                let b = batch(
                    engine
                        .generate_questions("physics", Difficulty::Medium, n)
                        .await
                        .unwrap(),
                );
                assert_sealed(&b, n);
            }
        }
    }

    #[tokio::test]
    async fn duplicate_model_ids_are_replaced() {
        let raw = format!(
            "[{0},{0},{0}]",
            r#"{"id":"7","text":"Same id","options":["a","b","c","d"],"correctAnswer":1,"explanation":"e"}"#
        );
        let (engine, _) = engine(physics_index(), vec![Ok(raw)]);
        let b = batch(
            engine
                .generate_questions("Physics", Difficulty::Easy, 3)
                .await
                .unwrap(),
        );
        let ids: HashSet<&str> = b.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_sealed(&b, 3);
    }

    #[tokio::test]
    async fn retry_failure_falls_back_to_initial_batch() {
        let (engine, completion) = engine(
            physics_index(),
            vec![Ok(questions_json("first", 3)), Ok("not json".into())],
        );
        let b = batch(
            engine
                .generate_questions("Physics", Difficulty::Easy, 5)
                .await
                .unwrap(),
        );
        assert_sealed(&b, 5);
        assert_eq!(completion.calls(), 2);
        assert_eq!(b.repair().padded, 2);
        assert!(b.questions().iter().all(|q| q.text.starts_with("first ")));
    }

    fn engine_with_timeout(
        completion: Arc<ScriptedCompletion>,
        secs: u64,
    ) -> QuestionEngine {
        QuestionEngine::new(
            GenerationConfig {
                completion_timeout: Duration::from_secs(secs),
                ..GenerationConfig::default()
            },
            Arc::new(FixedEmbedder::default()),
            Arc::new(physics_index()),
            completion,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn retry_timeout_falls_back_to_initial_batch() {
        let completion = Arc::new(
            ScriptedCompletion::new(vec![
                Ok(questions_json("first", 2)),
                Ok(questions_json("late", 4)),
            ])
            .with_delay_from(1, Duration::from_secs(40)),
        );
        let engine = engine_with_timeout(completion.clone(), 30);

        let b = batch(
            engine
                .generate_questions("Physics", Difficulty::Hard, 4)
                .await
                .unwrap(),
        );
        assert_sealed(&b, 4);
        assert_eq!(completion.calls(), 2);
        assert_eq!(b.repair().padded, 2);
        assert!(b.questions().iter().all(|q| q.text.starts_with("first ")));
    }

    #[tokio::test(start_paused = true)]
    async fn initial_timeout_is_a_completion_failure() {
        let completion = Arc::new(
            ScriptedCompletion::new(vec![Ok(questions_json("late", 4))])
                .with_delay(Duration::from_secs(40)),
        );
        let engine = engine_with_timeout(completion.clone(), 30);

        let f = generation_failure(
            engine
                .generate_questions("Physics", Difficulty::Hard, 4)
                .await
                .unwrap_err(),
        );
        assert_eq!(f.stage, Stage::Completion);
        assert!(matches!(f.cause, FailureCause::Completion(CompletionError::Timeout(_))));
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn empty_model_arrays_fail_at_reconcile() {
        let (engine, completion) = engine(physics_index(), vec![Ok("[]".into()), Ok("[]".into())]);
        let f = generation_failure(
            engine
                .generate_questions("Physics", Difficulty::Easy, 3)
                .await
                .unwrap_err(),
        );
        assert_eq!(f.stage, Stage::Reconcile);
        assert!(matches!(f.cause, FailureCause::EmptyBatch { attempts: 2 }));
        assert_eq!(completion.calls(), 2);
    }

    #[tokio::test]
    async fn provider_error_on_initial_call_is_escalated() {
        let (engine, _) = engine(
            physics_index(),
            vec![Err(CompletionError::Timeout(Duration::from_secs(45)))],
        );
        let f = generation_failure(
            engine
                .generate_questions("Physics", Difficulty::Easy, 3)
                .await
                .unwrap_err(),
        );
        assert_eq!(f.stage, Stage::Completion);
    }

    #[tokio::test]
    async fn filtered_rejection_drops_off_subject_chunks() {
        let (engine, completion) = engine(
            physics_index().reject_filtered(),
            vec![Ok(questions_json("phys", 2))],
        );
        let b = batch(
            engine
                .generate_questions("Physics", Difficulty::Easy, 2)
                .await
                .unwrap(),
        );
        assert_sealed(&b, 2);
        assert_eq!(completion.calls(), 1);
        assert_eq!(b.provenance().retrieval, RetrievalMode::UnfilteredFallback);
        assert!(b.provenance().grounded);
        assert!(!b.provenance().source_files.contains("organic.pdf"));
        assert!(b.provenance().source_files.contains("mechanics.pdf"));
        assert!(!completion.prompts()[0].contains("Benzene"));

        let ctx = engine
            .planner
            .plan(&RetrievalRequest::new("Physics", Difficulty::Easy, 2, 100).unwrap())
            .await
            .unwrap();
        assert_eq!(ctx.retrieval(), RetrievalMode::UnfilteredFallback);
    }

    #[tokio::test]
    async fn embedding_failure_is_a_retrieval_failure() {
        let completion = Arc::new(ScriptedCompletion::new(vec![]));
        let engine = QuestionEngine::new(
            GenerationConfig::default(),
            Arc::new(FixedEmbedder::failing()),
            Arc::new(physics_index()),
            completion.clone(),
        )
        .unwrap();
        let f = generation_failure(
            engine
                .generate_questions("Physics", Difficulty::Easy, 3)
                .await
                .unwrap_err(),
        );
        assert_eq!(f.stage, Stage::Retrieval);
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_up_front() {
        let (engine, completion) = engine(physics_index(), vec![]);
        let err = engine
            .generate_questions("   ", Difficulty::Easy, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuestionEngineError::InvalidRequest(RequestError::EmptySubject)
        ));
        let err = engine
            .generate_questions("Physics", Difficulty::Easy, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuestionEngineError::InvalidRequest(RequestError::CountOutOfRange { .. })
        ));
        assert_eq!(completion.calls(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = GenerationConfig {
            top_k: 0,
            ..GenerationConfig::default()
        };
        let res = QuestionEngine::new(
            cfg,
            Arc::new(FixedEmbedder::default()),
            Arc::new(physics_index()),
            Arc::new(ScriptedCompletion::new(vec![])),
        );
        assert!(res.is_err());
    }
}
