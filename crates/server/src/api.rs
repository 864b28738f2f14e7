//! HTTP API for predictions and health checks

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use predictor_lib::{
    Grade, Outcome, PredictorDescription, PredictorError, RawInput, StructuredLogger,
    StudentPredictor,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<StudentPredictor>,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(predictor: Arc<StudentPredictor>, logger: StructuredLogger) -> Self {
        Self { predictor, logger }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub models: PredictorDescription,
}

#[derive(Debug, Serialize)]
pub struct ParentalLevelsResponse {
    pub levels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: i32,
    pub grade: Grade,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    pub label: Outcome,
    pub pass_probability: f64,
    pub fail_probability: f64,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Predictor error mapped onto an HTTP status
pub struct ApiError(PredictorError);

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            PredictorError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            PredictorError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, "model"),
            PredictorError::Load { .. } | PredictorError::Schema(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        let body = ErrorBody {
            error,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check - models are loaded before the router exists, so a
/// running service is always healthy
async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        models: state.predictor.describe(),
    })
}

async fn parental_levels(State(state): State<Arc<AppState>>) -> Json<ParentalLevelsResponse> {
    Json(ParentalLevelsResponse {
        levels: state.predictor.list_parental_levels(),
    })
}

async fn predict_score(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RawInput>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let result = state.predictor.predict_score(&input)?;
    Ok(Json(ScoreResponse {
        score: result.score,
        grade: result.grade,
        model_version: state.predictor.score_model().version.clone(),
        predicted_at: Utc::now(),
    }))
}

async fn predict_outcome(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RawInput>,
) -> Result<Json<OutcomeResponse>, ApiError> {
    let result = state.predictor.predict_outcome(&input)?;
    Ok(Json(OutcomeResponse {
        label: result.label,
        pass_probability: result.pass_probability,
        fail_probability: result.fail_probability,
        model_version: state.predictor.outcome_model().version.clone(),
        predicted_at: Utc::now(),
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/parental-levels", get(parental_levels))
        .route("/api/v1/predict/score", post(predict_score))
        .route("/api/v1/predict/outcome", post(predict_outcome))
        .with_state(state)
}

/// Start the API server and run until ctrl-c
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let logger = state.logger.clone();
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                logger.log_shutdown("SIGINT received");
            }
        })
        .await?;

    Ok(())
}
