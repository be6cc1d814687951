use std::error::Error;

use ai_llm_service::telemetry;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine: variables may come from the process environment.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::DEBUG))
        .with(telemetry::layer())
        .init();

    api::start().await?;

    Ok(())
}
