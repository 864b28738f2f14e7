//! Error taxonomy for the predictor core

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the predictor core
///
/// `Load` and `Schema` are fatal at startup. `Validation` rejects a single
/// request and is safe to show to the caller. `Model` means the model
/// itself misbehaved and is never retried.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to load model artifact {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("invalid feature schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model invocation failed: {0}")]
    Model(String),
}

impl PredictorError {
    pub fn load(path: &Path, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema(reason.into())
    }

    /// Wrap a failure raised inside a model implementation
    pub fn model(err: anyhow::Error) -> Self {
        Self::Model(format!("{:#}", err))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A rejected raw input record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown parental education level '{level}' (expected one of: {})", known.join(", "))]
    UnknownParentalLevel { level: String, known: Vec<String> },
}

pub type Result<T> = std::result::Result<T, PredictorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = PredictorError::from(ValidationError::OutOfRange {
            field: "study_hours",
            value: 150.0,
            min: 0.0,
            max: 100.0,
        });
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "study_hours must lie in [0, 100], got 150");
    }

    #[test]
    fn test_unknown_level_lists_choices() {
        let err = ValidationError::UnknownParentalLevel {
            level: "Doctorate".to_string(),
            known: vec!["Bachelors".to_string(), "PhD".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown parental education level 'Doctorate' (expected one of: Bachelors, PhD)"
        );
    }

    #[test]
    fn test_model_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("tensor shape mismatch").context("Failed to run graph");
        let err = PredictorError::model(inner);
        assert_eq!(
            err.to_string(),
            "model invocation failed: Failed to run graph: tensor shape mismatch"
        );
    }
}
