use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use question_engine::{QuestionEngineError, RequestError};
use thiserror::Error;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error(transparent)]
    Engine(#[from] QuestionEngineError),
}

impl AppError {
    pub fn config(err: impl Display) -> Self {
        AppError::Config(err.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Engine(QuestionEngineError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Engine(QuestionEngineError::Generation(_)) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Engine(QuestionEngineError::InvalidRequest(_)) => "BAD_REQUEST",
            AppError::Engine(QuestionEngineError::Generation(_)) => "GENERATION_FAILED",
        }
    }

    /// Client-facing message. Generation failures stay generic; the full
    /// context is in the server log.
    fn public_message(&self) -> String {
        match self {
            AppError::Engine(QuestionEngineError::Generation(_)) => {
                "Question generation failed. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        let detail = |path: &str, hint: &str| ApiErrorDetail {
            path: Some(path.to_string()),
            hint: Some(hint.to_string()),
        };
        match self {
            AppError::Engine(QuestionEngineError::InvalidRequest(e)) => match e {
                RequestError::EmptySubject => vec![detail("subject", "Provide a subject name.")],
                RequestError::CountOutOfRange { max, .. } => {
                    vec![detail("count", &format!("Use a value between 1 and {max}."))]
                }
                RequestError::InvalidDifficulty(_) => {
                    vec![detail("difficulty", "Use one of: easy, medium, hard.")]
                }
            },
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(self.error_code(), self.public_message(), self.details())
            .into_response_with_status(self.status_code())
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        AppError::Engine(QuestionEngineError::InvalidRequest(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use question_engine::{Difficulty, GenerationFailure, Stage, error::FailureCause};

    #[test]
    fn invalid_requests_map_to_400() {
        let e: AppError = RequestError::CountOutOfRange { count: 0, max: 100 }.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.error_code(), "BAD_REQUEST");
        assert_eq!(e.details()[0].path.as_deref(), Some("count"));
    }

    #[test]
    fn generation_failures_map_to_502_with_generic_message() {
        let e = AppError::Engine(QuestionEngineError::Generation(Box::new(GenerationFailure {
            stage: Stage::Reconcile,
            subject: "Physics".into(),
            difficulty: Difficulty::Easy,
            count: 5,
            cause: FailureCause::EmptyBatch { attempts: 2 },
        })));
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(e.error_code(), "GENERATION_FAILED");
        assert!(e.public_message().contains("try again later"));
        assert!(e.details().is_empty());
    }
}
