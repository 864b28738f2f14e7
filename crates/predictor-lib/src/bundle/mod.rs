//! Model bundles: a fitted model paired with the feature list it expects
//!
//! Artifacts are JSON documents whose top level is the two-element array
//! `[model, feature_names]`. A sidecar `<artifact>.sha256` file, when
//! present, must match the artifact bytes.

mod forest;
mod linear;
pub(crate) mod onnx;

pub use forest::{DecisionTree, RandomForest, TreeNode};
pub use linear::{LinearRegression, LogisticRegression};
pub use onnx::{OnnxClassifier, OnnxRegressor, OnnxSpec};

use crate::error::{PredictorError, Result};
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default artifact file names inside a model directory
pub const SCORE_MODEL_FILE: &str = "linear_regression_model.json";
pub const OUTCOME_MODEL_FILE: &str = "rf_classifier.json";

/// Fitted regression model
pub trait Regressor: Send + Sync {
    /// Predict a continuous value for one positional row
    fn predict(&self, row: &[f64]) -> anyhow::Result<f64>;

    /// Input width the model was fitted with, when it declares one
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn kind(&self) -> &'static str;
}

/// Fitted binary classifier
pub trait Classifier: Send + Sync {
    /// Class label from the model's own decision rule (`0` or `1`)
    fn predict(&self, row: &[f64]) -> anyhow::Result<i64>;

    /// Class probabilities ordered `[class 0, class 1]`
    fn predict_proba(&self, row: &[f64]) -> anyhow::Result<[f64; 2]>;

    /// Label and probabilities for one row; implementations whose
    /// inference yields both at once override this to run a single pass
    fn predict_with_proba(&self, row: &[f64]) -> anyhow::Result<(i64, [f64; 2])> {
        Ok((self.predict(row)?, self.predict_proba(row)?))
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn kind(&self) -> &'static str;
}

/// Serialized model object, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    Onnx(OnnxSpec),
}

/// Provenance of a loaded bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleInfo {
    pub path: Option<PathBuf>,
    pub kind: String,
    /// Leading hex digits of the artifact's SHA-256
    pub version: String,
    pub feature_count: usize,
}

/// Immutable model handle plus the schema its rows must follow
pub struct ModelBundle<M: ?Sized> {
    model: Box<M>,
    schema: Arc<FeatureSchema>,
    info: BundleInfo,
}

impl BundleInfo {
    fn from_artifact(path: &Path, digest: &str, kind: &str, feature_count: usize) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            kind: kind.to_string(),
            version: digest[..VERSION_DIGITS].to_string(),
            feature_count,
        }
    }
}

pub type RegressionBundle = ModelBundle<dyn Regressor>;
pub type ClassificationBundle = ModelBundle<dyn Classifier>;

impl<M: ?Sized> ModelBundle<M> {
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn info(&self) -> &BundleInfo {
        &self.info
    }
}

impl<M: ?Sized> std::fmt::Debug for ModelBundle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("info", &self.info)
            .field("schema", &self.schema.names())
            .finish()
    }
}

const IN_MEMORY_VERSION: &str = "in-memory";
const VERSION_DIGITS: usize = 12;

fn ensure_width(declared: Option<usize>, schema: &FeatureSchema) -> std::result::Result<(), String> {
    match declared {
        Some(n) if n != schema.len() => Err(format!(
            "model expects {} features but the feature list has {}",
            n,
            schema.len()
        )),
        _ => Ok(()),
    }
}

impl RegressionBundle {
    /// Pair an already-fitted regressor with its feature list
    ///
    /// The feature list becomes the regression schema and must carry the
    /// parental one-hot group.
    pub fn regression<S: AsRef<str>>(model: Box<dyn Regressor>, feature_names: &[S]) -> Result<Self> {
        let schema = FeatureSchema::derive(feature_names)?;
        ensure_width(model.n_features(), &schema).map_err(PredictorError::Schema)?;
        Ok(Self {
            info: BundleInfo {
                path: None,
                kind: model.kind().to_string(),
                version: IN_MEMORY_VERSION.to_string(),
                feature_count: schema.len(),
            },
            model,
            schema: Arc::new(schema),
        })
    }

    /// Load the regression artifact and derive the regression schema
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = Artifact::read(path)?;
        let model: Box<dyn Regressor> = match artifact.spec {
            ModelSpec::LinearRegression(model) => {
                model.validate().map_err(|e| load_error(path, e))?;
                Box::new(model)
            }
            ModelSpec::Onnx(spec) => {
                let graph = spec.resolve(path);
                Box::new(
                    OnnxRegressor::load(&graph, artifact.feature_names.len())
                        .map_err(|e| load_error(path, e))?,
                )
            }
            other => {
                return Err(PredictorError::load(
                    path,
                    format!("expected a regression model, found {}", spec_kind(&other)),
                ))
            }
        };

        let schema = FeatureSchema::derive(&artifact.feature_names)?;
        ensure_width(model.n_features(), &schema).map_err(|e| PredictorError::load(path, e))?;
        let bundle = Self {
            info: BundleInfo::from_artifact(&artifact.path, &artifact.digest, model.kind(), schema.len()),
            model,
            schema: Arc::new(schema),
        };
        log_loaded(&bundle.info);
        Ok(bundle)
    }
}

impl ClassificationBundle {
    /// Pair an already-fitted classifier with its feature list, checked
    /// against the regression schema
    pub fn classification<S: AsRef<str>>(
        model: Box<dyn Classifier>,
        feature_names: &[S],
        regression_schema: &FeatureSchema,
    ) -> Result<Self> {
        let schema = regression_schema.subset(feature_names)?;
        ensure_width(model.n_features(), &schema).map_err(PredictorError::Schema)?;
        Ok(Self {
            info: BundleInfo {
                path: None,
                kind: model.kind().to_string(),
                version: IN_MEMORY_VERSION.to_string(),
                feature_count: schema.len(),
            },
            model,
            schema: Arc::new(schema),
        })
    }

    /// Load the classifier artifact; its feature list must be an
    /// order-preserving subset of `regression_schema`
    pub fn load(path: &Path, regression_schema: &FeatureSchema) -> Result<Self> {
        let artifact = Artifact::read(path)?;
        let model: Box<dyn Classifier> = match artifact.spec {
            ModelSpec::RandomForest(model) => {
                model.validate().map_err(|e| load_error(path, e))?;
                Box::new(model)
            }
            ModelSpec::LogisticRegression(model) => {
                model.validate().map_err(|e| load_error(path, e))?;
                Box::new(model)
            }
            ModelSpec::Onnx(spec) => {
                let graph = spec.resolve(path);
                Box::new(
                    OnnxClassifier::load(&graph, artifact.feature_names.len())
                        .map_err(|e| load_error(path, e))?,
                )
            }
            other => {
                return Err(PredictorError::load(
                    path,
                    format!("expected a classification model, found {}", spec_kind(&other)),
                ))
            }
        };

        let schema = regression_schema.subset(&artifact.feature_names)?;
        ensure_width(model.n_features(), &schema).map_err(|e| PredictorError::load(path, e))?;
        let bundle = Self {
            info: BundleInfo::from_artifact(&artifact.path, &artifact.digest, model.kind(), schema.len()),
            model,
            schema: Arc::new(schema),
        };
        log_loaded(&bundle.info);
        Ok(bundle)
    }
}

fn load_error(path: &Path, err: anyhow::Error) -> PredictorError {
    PredictorError::load(path, format!("{:#}", err))
}

fn spec_kind(spec: &ModelSpec) -> &'static str {
    match spec {
        ModelSpec::LinearRegression(_) => "linear_regression",
        ModelSpec::LogisticRegression(_) => "logistic_regression",
        ModelSpec::RandomForest(_) => "random_forest",
        ModelSpec::Onnx(_) => "onnx",
    }
}

fn log_loaded(info: &BundleInfo) {
    info!(
        event = "model_loaded",
        path = ?info.path,
        kind = %info.kind,
        version = %info.version,
        features = info.feature_count,
        "Model artifact loaded"
    );
}

/// Decoded artifact envelope
struct Artifact {
    path: PathBuf,
    digest: String,
    spec: ModelSpec,
    feature_names: Vec<String>,
}

impl Artifact {
    fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| PredictorError::load(path, e.to_string()))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        verify_checksum(path, &digest)?;

        let (spec, feature_names): (ModelSpec, Vec<String>) = serde_json::from_slice(&bytes)
            .map_err(|e| {
                PredictorError::load(
                    path,
                    format!("expected a [model, feature_names] pair: {}", e),
                )
            })?;

        debug!(path = %path.display(), digest = %digest, "Artifact decoded");
        Ok(Self {
            path: path.to_path_buf(),
            digest,
            spec,
            feature_names,
        })
    }
}

/// Path of the optional checksum sidecar for `path`
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".sha256");
    PathBuf::from(name)
}

fn verify_checksum(path: &Path, digest: &str) -> Result<()> {
    let sidecar = checksum_path(path);
    let expected = match fs::read_to_string(&sidecar) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(PredictorError::load(
                path,
                format!("cannot read checksum file {}: {}", sidecar.display(), e),
            ))
        }
    };

    // sha256sum format: "<hex>  <file name>"
    let expected = expected.split_whitespace().next().unwrap_or_default();
    if !expected.eq_ignore_ascii_case(digest) {
        return Err(PredictorError::load(
            path,
            format!("checksum mismatch: expected {}, got {}", expected, digest),
        ));
    }
    Ok(())
}
