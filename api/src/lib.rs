use std::{env, sync::Arc};

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::error_handler::AppError;
use crate::{
    core::app_state::AppState,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        generate::generate_questions_route::generate_questions_route,
        health::health_route::health_route, models::models_route::models_route,
    },
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

/// Build state from the environment, bind `API_ADDRESS` and serve until Ctrl+C.
///
/// # Errors
/// Returns [`AppError`] on invalid configuration, bind failure or server error.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());
    let state = Arc::new(AppState::from_env()?);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "http api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("http api stopped");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/generate_questions", post(generate_questions_route))
        .route("/health", get(health_route))
        .route("/models", get(models_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
