use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use question_engine::{Difficulty, GenerationOutcome};
use tracing::{debug, info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::generate::generate_questions_request::GenerateQuestionsRequest,
};

/// Generate an exact-count batch of questions grounded in uploaded documents.
///
/// `data` is either a sealed batch (`kind: "batch"`) or a graceful decline
/// (`kind: "no_content"`) when no material exists for the subject; both are 200.
#[instrument(
    name = "generate_questions_route",
    skip_all,
    fields(subject = %body.subject, count = body.count)
)]
pub async fn generate_questions_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateQuestionsRequest>,
) -> AppResult<Response> {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    let difficulty: Difficulty = body.difficulty.parse()?;
    let outcome = state
        .engine
        .generate_questions(&body.subject, difficulty, body.count)
        .await?;

    match &outcome {
        GenerationOutcome::Batch(b) => info!(
            questions = b.actual_count(),
            grounded = b.provenance().grounded,
            retrieval = ?b.provenance().retrieval,
            "questions generated"
        ),
        GenerationOutcome::NoContent(_) => info!("no material for subject"),
    }

    Ok(ApiResponse::success(outcome).into_response_with_status(StatusCode::OK))
}
