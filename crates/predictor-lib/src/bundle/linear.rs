//! Linear model families

use super::{Classifier, Regressor};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Ordinary least squares model: `intercept + coefficients · row`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Binary logistic model over the same linear form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

fn validate_weights(intercept: f64, coefficients: &[f64]) -> Result<()> {
    ensure!(!coefficients.is_empty(), "model has no coefficients");
    ensure!(
        intercept.is_finite() && coefficients.iter().all(|c| c.is_finite()),
        "model weights must be finite"
    );
    Ok(())
}

fn linear_form(intercept: f64, coefficients: &[f64], row: &[f64]) -> Result<f64> {
    ensure!(
        row.len() == coefficients.len(),
        "row has {} values, model expects {}",
        row.len(),
        coefficients.len()
    );
    Ok(intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>())
}

impl LinearRegression {
    pub fn validate(&self) -> Result<()> {
        validate_weights(self.intercept, &self.coefficients)
    }
}

impl Regressor for LinearRegression {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        linear_form(self.intercept, &self.coefficients, row)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn kind(&self) -> &'static str {
        "linear_regression"
    }
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<()> {
        validate_weights(self.intercept, &self.coefficients)
    }

    /// Signed distance to the decision boundary; positive means pass
    pub fn decision_function(&self, row: &[f64]) -> Result<f64> {
        linear_form(self.intercept, &self.coefficients, row)
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, row: &[f64]) -> Result<i64> {
        Ok(if self.decision_function(row)? > 0.0 { 1 } else { 0 })
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        let z = self.decision_function(row)?;
        let pass = 1.0 / (1.0 + (-z).exp());
        Ok([1.0 - pass, pass])
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_prediction() {
        let model = LinearRegression {
            intercept: 5.0,
            coefficients: vec![2.0, -1.0, 0.5],
        };
        let y = model.predict(&[1.0, 3.0, 10.0]).unwrap();
        assert!((y - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let model = LinearRegression {
            intercept: 0.0,
            coefficients: vec![1.0, 1.0],
        };
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_weights_validated() {
        let empty = LinearRegression {
            intercept: 0.0,
            coefficients: vec![],
        };
        assert!(empty.validate().is_err());

        let nan = LogisticRegression {
            intercept: f64::NAN,
            coefficients: vec![1.0],
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_logistic_label_follows_decision_function() {
        let model = LogisticRegression {
            intercept: -4.0,
            coefficients: vec![0.1],
        };
        for x in [0.0, 20.0, 39.0, 40.0, 41.0, 80.0] {
            let row = [x];
            let z = model.decision_function(&row).unwrap();
            let label = model.predict(&row).unwrap();
            assert_eq!(label == 1, z > 0.0, "x = {}", x);

            let [fail, pass] = model.predict_proba(&row).unwrap();
            assert!((fail + pass - 1.0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&pass));
        }
    }

    #[test]
    fn test_deserializes_from_artifact_fields() {
        let model: LinearRegression =
            serde_json::from_str(r#"{"intercept": 1.5, "coefficients": [0.25, 0.75]}"#).unwrap();
        assert_eq!(model.coefficients, vec![0.25, 0.75]);
        assert_eq!(model.n_features(), Some(2));
    }
}
