use axum::{http::StatusCode, response::Response};
use ai_llm_service::catalog;

use crate::core::http::response_envelope::ApiResponse;

/// Known models per provider and whether each provider has an API key configured.
pub async fn models_route() -> Response {
    ApiResponse::success(catalog::list_available()).into_response_with_status(StatusCode::OK)
}
