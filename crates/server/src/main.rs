//! Student Predictor - exam score and pass/fail prediction service
//!
//! Loads the regression and classifier artifacts once at startup and serves
//! predictions over a small JSON API.

use anyhow::{Context, Result};
use predictor_lib::{StructuredLogger, StudentPredictor};
use std::sync::Arc;
use student_predictor::{api, config::ServiceConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting student-predictor");

    let config = ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.model_dir.display(),
        score_policy = ?config.score_policy,
        "Predictor configured"
    );

    let logger = StructuredLogger::new(&config.instance_name);

    // Model artifacts are loaded exactly once; failures here are fatal
    let predictor = StudentPredictor::load(&config.model_paths(), config.score_policy)
        .context("Failed to load model artifacts")?
        .with_logger(logger.clone());
    logger.log_startup(
        SERVICE_VERSION,
        predictor.score_model(),
        predictor.outcome_model(),
    );

    let state = Arc::new(api::AppState::new(Arc::new(predictor), logger));
    api::serve(&config.listen_addr(), state).await?;

    info!("Shut down");
    Ok(())
}
