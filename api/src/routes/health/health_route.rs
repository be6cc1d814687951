use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::{debug, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::{HealthResponse, VectorStoreHealth},
};

/// Probe the LLM profiles and Qdrant. Always answers 200; `ok` tells the story.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let llm = state.llm.health_all().await;

    let collection = state.store.config().collection.clone();
    let vector_store = match state.store.health().await {
        Ok(version) => VectorStoreHealth {
            ok: true,
            collection,
            version: Some(version),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "vector store health check failed");
            VectorStoreHealth {
                ok: false,
                collection,
                version: None,
                error: Some(e.to_string()),
            }
        }
    };

    let ok = vector_store.ok && llm.iter().all(|s| s.ok);
    debug!(ok, probes = llm.len(), "health checked");

    ApiResponse::success(HealthResponse {
        ok,
        llm,
        vector_store,
    })
    .into_response_with_status(StatusCode::OK)
}
