//! Prediction engine
//!
//! [`StudentPredictor`] owns both model bundles and is the only surface the
//! front ends talk to. It is immutable after construction and can be
//! shared across threads behind an `Arc`.

mod inference;
mod output;


pub use inference::{predict_outcome, predict_score};
pub use output::{outcome_from_model, ScorePolicy, PROBABILITY_TOLERANCE, SCORE_MAX, SCORE_MIN};

use crate::bundle::{
    BundleInfo, ClassificationBundle, RegressionBundle, OUTCOME_MODEL_FILE, SCORE_MODEL_FILE,
};
use crate::error::{PredictorError, Result};
use crate::features::{FeatureBuilder, FeatureVector};
use crate::grader::grade;
use crate::models::{OutcomeResult, RawInput, ScoreResult};
use crate::observability::StructuredLogger;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Locations of the two model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub score_model: PathBuf,
    pub outcome_model: PathBuf,
}

impl ModelPaths {
    /// Default artifact names inside `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            score_model: dir.join(SCORE_MODEL_FILE),
            outcome_model: dir.join(OUTCOME_MODEL_FILE),
        }
    }
}

/// Metadata of the loaded bundles and the active score policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictorDescription {
    pub score_model: BundleInfo,
    pub outcome_model: BundleInfo,
    pub score_policy: ScorePolicy,
}

pub struct StudentPredictor {
    score_bundle: RegressionBundle,
    outcome_bundle: ClassificationBundle,
    builder: FeatureBuilder,
    policy: ScorePolicy,
    logger: StructuredLogger,
}

impl StudentPredictor {
    /// Assemble a predictor from two loaded bundles
    ///
    /// Fails with a schema error if the classifier's columns are not an
    /// order-preserving subset of the regression columns.
    pub fn new(
        score_bundle: RegressionBundle,
        outcome_bundle: ClassificationBundle,
        policy: ScorePolicy,
    ) -> Result<Self> {
        outcome_bundle
            .schema()
            .ensure_subset_of(score_bundle.schema())?;
        let builder = FeatureBuilder::new(score_bundle.schema());
        Ok(Self {
            score_bundle,
            outcome_bundle,
            builder,
            policy,
            logger: StructuredLogger::default(),
        })
    }

    /// Load both artifacts; the regression artifact goes first because it
    /// defines the schema the classifier is checked against
    pub fn load(paths: &ModelPaths, policy: ScorePolicy) -> Result<Self> {
        let score_bundle = RegressionBundle::load(&paths.score_model)?;
        let outcome_bundle = ClassificationBundle::load(&paths.outcome_model, score_bundle.schema())?;
        Self::new(score_bundle, outcome_bundle, policy)
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    pub fn score_model(&self) -> &BundleInfo {
        self.score_bundle.info()
    }

    pub fn outcome_model(&self) -> &BundleInfo {
        self.outcome_bundle.info()
    }

    pub fn describe(&self) -> PredictorDescription {
        PredictorDescription {
            score_model: self.score_model().clone(),
            outcome_model: self.outcome_model().clone(),
            score_policy: self.policy,
        }
    }

    /// Valid parental education levels, in regression column order
    pub fn list_parental_levels(&self) -> Vec<String> {
        self.builder.parental_levels().to_vec()
    }

    /// Row for the regression model
    pub fn score_features(&self, input: &RawInput) -> Result<FeatureVector> {
        self.builder.build(input, self.score_bundle.schema())
    }

    /// Row for the classifier
    pub fn outcome_features(&self, input: &RawInput) -> Result<FeatureVector> {
        self.builder.build(input, self.outcome_bundle.schema())
    }

    /// Predict the final exam score and its letter grade
    pub fn predict_score(&self, input: &RawInput) -> Result<ScoreResult> {
        let result = self
            .score_features(input)
            .and_then(|features| predict_score(&self.score_bundle, &features, self.policy))
            .map(|score| ScoreResult {
                score,
                grade: grade(score),
            });
        match &result {
            Ok(r) => self
                .logger
                .log_score(r.score, r.grade, &self.score_model().version),
            Err(e) => self.log_failure("predict_score", e),
        }
        result
    }

    /// Predict pass/fail with both class probabilities
    pub fn predict_outcome(&self, input: &RawInput) -> Result<OutcomeResult> {
        let result = self
            .outcome_features(input)
            .and_then(|features| predict_outcome(&self.outcome_bundle, &features));
        match &result {
            Ok(r) => self.logger.log_outcome(
                r.label,
                r.pass_probability,
                &self.outcome_model().version,
            ),
            Err(e) => self.log_failure("predict_outcome", e),
        }
        result
    }

    fn log_failure(&self, operation: &str, err: &PredictorError) {
        self.logger
            .log_rejected(operation, err.is_validation(), &err.to_string());
    }
}

impl std::fmt::Debug for StudentPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentPredictor")
            .field("score_model", self.score_model())
            .field("outcome_model", self.outcome_model())
            .field("policy", &self.policy)
            .finish()
    }
}
