//! API client for the Student Predictor service

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failures reported by the service itself
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service refused the student record (HTTP 422)
    #[error("input rejected: {message}")]
    Rejected { message: String },

    #[error("API error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// API client for the Student Predictor service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            let err = if status.as_u16() == 422 {
                ApiError::Rejected { message }
            } else {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            };
            return Err(err.into());
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn parental_levels(&self) -> Result<Vec<String>> {
        let levels: ParentalLevels = self.get("api/v1/parental-levels").await?;
        Ok(levels.levels)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("healthz").await
    }

    pub async fn predict_score(&self, student: &StudentRecord) -> Result<ScorePrediction> {
        self.post("api/v1/predict/score", student).await
    }

    pub async fn predict_outcome(&self, student: &StudentRecord) -> Result<OutcomePrediction> {
        self.post("api/v1/predict/outcome", student).await
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    pub internet_access: String,
    pub extracurricular: String,
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub past_exam_score: f64,
    pub parental_education_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentalLevels {
    pub levels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub kind: String,
    pub version: String,
    pub feature_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub score_model: ModelInfo,
    pub outcome_model: ModelInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePrediction {
    pub score: i32,
    pub grade: String,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomePrediction {
    pub label: String,
    pub pass_probability: f64,
    pub fail_probability: f64,
    pub model_version: String,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentRecord {
        StudentRecord {
            gender: "male".to_string(),
            internet_access: "yes".to_string(),
            extracurricular: "no".to_string(),
            study_hours: 10.0,
            attendance_rate: 90.0,
            past_exam_score: 75.0,
            parental_education_level: "Bachelors".to_string(),
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_parental_levels() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/parental-levels")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"levels": ["Bachelors", "PhD"]}"#)
            .create_async()
            .await;

        let levels = client_for(&server).parental_levels().await.unwrap();
        assert_eq!(levels, vec!["Bachelors", "PhD"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_score_posts_student_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/predict/score")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "gender": "male",
                "study_hours": 10.0,
                "parental_education_level": "Bachelors"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"score": 72, "grade": "C", "model_version": "137b2afb095c",
                    "predicted_at": "2026-10-19T12:00:00Z"}"#,
            )
            .create_async()
            .await;

        let prediction = client_for(&server).predict_score(&student()).await.unwrap();
        assert_eq!(prediction.score, 72);
        assert_eq!(prediction.grade, "C");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validation_failure_maps_to_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict/outcome")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": "validation", "message": "study_hours must lie in [0, 100], got 150"}"#,
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .predict_outcome(&student())
            .await
            .unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Rejected { message }) => assert!(message.contains("study_hours")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server).health().await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Server { status, message }) => {
                assert_eq!(*status, 503);
                assert_eq!(message, "unavailable");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
