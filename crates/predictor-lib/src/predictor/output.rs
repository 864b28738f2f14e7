//! Post-processing of raw model outputs
//!
//! Turns a continuous regression output into a bounded integer score and a
//! classifier's label/probability pair into an [`OutcomeResult`].

use crate::error::{PredictorError, Result};
use crate::models::{Outcome, OutcomeResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lowest score the grading scale is defined for
pub const SCORE_MIN: i32 = 0;

/// Highest score the grading scale is defined for
pub const SCORE_MAX: i32 = 100;

/// Allowed drift of `p_pass + p_fail` from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// What to do with a rounded score outside [`SCORE_MIN`, `SCORE_MAX`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Clamp into range and log a warning
    #[default]
    Clamp,
    /// Fail the request with a model error
    Reject,
    /// Return the rounded value unchanged
    PassThrough,
}

impl ScorePolicy {
    /// Round half away from zero, then apply the policy
    pub fn apply(self, raw: f64) -> Result<i32> {
        if !raw.is_finite() {
            return Err(PredictorError::Model(format!(
                "regression output is not finite: {}",
                raw
            )));
        }

        let rounded = raw.round();
        let in_range = (SCORE_MIN as f64..=SCORE_MAX as f64).contains(&rounded);
        match self {
            _ if in_range => Ok(rounded as i32),
            Self::Clamp => {
                let clamped = rounded.clamp(SCORE_MIN as f64, SCORE_MAX as f64) as i32;
                warn!(raw_score = raw, clamped_score = clamped, "Score outside grading range, clamped");
                Ok(clamped)
            }
            Self::Reject => Err(PredictorError::Model(format!(
                "predicted score {} is outside [{}, {}]",
                rounded, SCORE_MIN, SCORE_MAX
            ))),
            // `as` saturates at the i32 bounds
            Self::PassThrough => Ok(rounded as i32),
        }
    }
}

/// Combine the classifier's label and `[fail, pass]` probabilities
pub fn outcome_from_model(label: i64, probabilities: [f64; 2]) -> Result<OutcomeResult> {
    let outcome = Outcome::from_label(label)
        .ok_or_else(|| PredictorError::Model(format!("unexpected class label {}", label)))?;

    let [fail, pass] = probabilities;
    if !(fail.is_finite() && pass.is_finite() && fail >= 0.0 && pass >= 0.0) {
        return Err(PredictorError::Model(format!(
            "invalid class probabilities [{}, {}]",
            fail, pass
        )));
    }
    if (fail + pass - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PredictorError::Model(format!(
            "class probabilities sum to {}, expected 1",
            fail + pass
        )));
    }

    Ok(OutcomeResult {
        label: outcome,
        pass_probability: pass,
        fail_probability: fail,
    })
}
