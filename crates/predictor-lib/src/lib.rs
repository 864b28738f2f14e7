//! Core library for student performance prediction
//!
//! This crate provides:
//! - Model artifact loading (linear, logistic, random forest, ONNX)
//! - Feature schema derivation and positional feature assembly
//! - Exam score and pass/fail prediction with letter grading
//! - Structured logging of prediction events

pub mod bundle;
pub mod error;
pub mod features;
pub mod grader;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;

pub use bundle::{BundleInfo, ClassificationBundle, ModelBundle, RegressionBundle};
pub use error::{PredictorError, Result, ValidationError};
pub use features::{FeatureBuilder, FeatureVector};
pub use grader::grade;
pub use models::*;
pub use observability::StructuredLogger;
pub use predictor::{ModelPaths, PredictorDescription, ScorePolicy, StudentPredictor};
pub use schema::FeatureSchema;
