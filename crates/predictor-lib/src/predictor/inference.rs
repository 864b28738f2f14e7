//! Model invocation
//!
//! Both entry points check that the row was assembled against the bundle's
//! own schema before any number reaches the model.

use super::output::{outcome_from_model, ScorePolicy};
use crate::bundle::{ClassificationBundle, ModelBundle, RegressionBundle};
use crate::error::{PredictorError, Result};
use crate::features::FeatureVector;
use crate::models::OutcomeResult;
use std::time::Instant;
use tracing::debug;

fn ensure_aligned<M: ?Sized>(bundle: &ModelBundle<M>, features: &FeatureVector) -> Result<()> {
    let expected = bundle.schema();
    if features.schema() != expected {
        return Err(PredictorError::Model(format!(
            "feature vector was built for columns {:?}, model expects {:?}",
            features.schema().names(),
            expected.names()
        )));
    }
    if features.len() != expected.len() {
        return Err(PredictorError::Model(format!(
            "feature vector has {} values, model expects {}",
            features.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Run the regression model and turn its output into an integer score
pub fn predict_score(
    bundle: &RegressionBundle,
    features: &FeatureVector,
    policy: ScorePolicy,
) -> Result<i32> {
    ensure_aligned(bundle, features)?;

    let start = Instant::now();
    let raw = bundle
        .model()
        .predict(features.values())
        .map_err(PredictorError::model)?;
    debug!(
        raw_score = raw,
        elapsed_us = start.elapsed().as_micros(),
        "Regression inference completed"
    );

    policy.apply(raw)
}

/// Run the classifier for its label and class probabilities
pub fn predict_outcome(
    bundle: &ClassificationBundle,
    features: &FeatureVector,
) -> Result<OutcomeResult> {
    ensure_aligned(bundle, features)?;

    let start = Instant::now();
    let (label, probabilities) = bundle
        .model()
        .predict_with_proba(features.values())
        .map_err(PredictorError::model)?;
    debug!(
        label = label,
        p_fail = probabilities[0],
        p_pass = probabilities[1],
        elapsed_us = start.elapsed().as_micros(),
        "Classifier inference completed"
    );

    outcome_from_model(label, probabilities)
}
