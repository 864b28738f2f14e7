//! ONNX inference using tract
//!
//! Runs graphs exported from the training environment (for example with
//! skl2onnx, zipmap disabled). Regressors read output 0 as the score.
//! Classifiers read output 0 as the label and output 1 as a `[1, 2]`
//! probability tensor ordered `[fail, pass]`.

use super::{Classifier, Regressor};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Artifact entry pointing at an ONNX graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxSpec {
    /// Graph location, relative to the artifact file
    pub path: PathBuf,
}

impl OnnxSpec {
    pub fn resolve(&self, artifact_path: &Path) -> PathBuf {
        match artifact_path.parent() {
            Some(dir) if self.path.is_relative() => dir.join(&self.path),
            _ => self.path.clone(),
        }
    }
}

/// Load and optimize an ONNX graph with a fixed `[1, n_features]` input
fn load_plan(path: &Path, n_features: usize) -> Result<TractModel> {
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("Failed to parse ONNX model {}", path.display()))?
        .with_input_fact(0, f32::fact([1, n_features]).into())
        .context("Failed to set input shape")?
        .into_optimized()
        .context("Failed to optimize model")?
        .into_runnable()
        .context("Failed to create runnable model")?;
    Ok(model)
}

fn row_to_tensor(row: &[f64], n_features: usize) -> Result<Tensor> {
    ensure!(
        row.len() == n_features,
        "row has {} values, model expects {}",
        row.len(),
        n_features
    );
    let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
    let array = tract_ndarray::Array2::from_shape_vec((1, n_features), data)?;
    Ok(array.into())
}

fn run(model: &TractModel, row: &[f64], n_features: usize) -> Result<TVec<TValue>> {
    let start = Instant::now();
    let input = row_to_tensor(row, n_features)?;
    let outputs = model.run(tvec!(input.into())).context("ONNX graph failed")?;
    debug!(elapsed_us = start.elapsed().as_micros(), "ONNX inference completed");
    Ok(outputs)
}

pub struct OnnxRegressor {
    model: TractModel,
    n_features: usize,
}

impl OnnxRegressor {
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        Ok(Self {
            model: load_plan(path, n_features)?,
            n_features,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        let outputs = run(&self.model, row, self.n_features)?;
        let output = outputs.first().context("No output from model")?;
        let values = output.cast_to::<f32>()?;
        let score = values
            .as_slice::<f32>()?
            .first()
            .copied()
            .context("Empty regression output")?;
        Ok(score as f64)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

pub struct OnnxClassifier {
    model: TractModel,
    n_features: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        Ok(Self {
            model: load_plan(path, n_features)?,
            n_features,
        })
    }
}

fn label_output(outputs: &[TValue]) -> Result<i64> {
    let label = outputs.first().context("Model has no label output")?;
    let labels = label.cast_to::<i64>()?;
    labels
        .as_slice::<i64>()?
        .first()
        .copied()
        .context("Empty label output")
}

fn probability_output(outputs: &[TValue]) -> Result<[f64; 2]> {
    let probabilities = outputs.get(1).context("Model has no probability output")?;
    let probabilities = probabilities.cast_to::<f32>()?;
    let values = probabilities.as_slice::<f32>()?;
    ensure!(
        values.len() == 2,
        "Probability output has {} values, expected 2",
        values.len()
    );
    Ok([values[0] as f64, values[1] as f64])
}

impl Classifier for OnnxClassifier {
    fn predict(&self, row: &[f64]) -> Result<i64> {
        let outputs = run(&self.model, row, self.n_features)?;
        label_output(&outputs)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        let outputs = run(&self.model, row, self.n_features)?;
        probability_output(&outputs)
    }

    /// Both outputs come from the same graph run
    fn predict_with_proba(&self, row: &[f64]) -> Result<(i64, [f64; 2])> {
        let outputs = run(&self.model, row, self.n_features)?;
        Ok((label_output(&outputs)?, probability_output(&outputs)?))
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
