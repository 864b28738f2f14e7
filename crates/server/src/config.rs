//! Service configuration

use anyhow::{Context, Result};
use predictor_lib::{ModelPaths, ScorePolicy};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an optional config file
pub const CONFIG_FILE_ENV: &str = "STUDENT_PREDICTOR_CONFIG";

/// Prefix for environment overrides, e.g. `PREDICTOR_API_PORT`
pub const ENV_PREFIX: &str = "PREDICTOR";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name attached to every log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding both model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Regression artifact file name inside `model_dir`
    #[serde(default = "default_score_model_file")]
    pub score_model_file: String,

    /// Classifier artifact file name inside `model_dir`
    #[serde(default = "default_outcome_model_file")]
    pub outcome_model_file: String,

    /// Handling of regression outputs outside 0-100
    #[serde(default)]
    pub score_policy: ScorePolicy,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "local".to_string())
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_score_model_file() -> String {
    predictor_lib::bundle::SCORE_MODEL_FILE.to_string()
}

fn default_outcome_model_file() -> String {
    predictor_lib::bundle::OUTCOME_MODEL_FILE.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            score_model_file: default_score_model_file(),
            outcome_model_file: default_outcome_model_file(),
            score_policy: ScorePolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the optional config file and environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(file, ENV_PREFIX)
    }

    /// Layer an optional file under environment variables with `env_prefix`
    pub fn load_from(file: Option<PathBuf>, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = &file {
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }
        let config = builder
            .add_source(config::Environment::with_prefix(env_prefix))
            .build()
            .context("Failed to read predictor configuration")?;

        config
            .try_deserialize()
            .context("Invalid predictor configuration")
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths {
            score_model: self.model_dir.join(&self.score_model_file),
            outcome_model: self.model_dir.join(&self.outcome_model_file),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = ServiceConfig::load_from(None, "PREDICTOR_TEST_UNSET").unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.score_policy, ScorePolicy::Clamp);
        assert_eq!(
            config.model_paths(),
            ModelPaths::from_dir("models")
        );
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_port = 9191\nmodel_dir = \"/srv/models\"\nscore_policy = \"reject\""
        )
        .unwrap();

        let config =
            ServiceConfig::load_from(Some(file.path().to_path_buf()), "PREDICTOR_TEST_FILE").unwrap();
        assert_eq!(config.api_port, 9191);
        assert_eq!(config.score_policy, ScorePolicy::Reject);
        assert_eq!(
            config.model_paths().score_model,
            PathBuf::from("/srv/models/linear_regression_model.json")
        );
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("PREDICTOR_TEST_ENV_API_PORT", "7000");
        std::env::set_var("PREDICTOR_TEST_ENV_SCORE_POLICY", "pass_through");
        let config = ServiceConfig::load_from(None, "PREDICTOR_TEST_ENV").unwrap();
        assert_eq!(config.api_port, 7000);
        assert_eq!(config.score_policy, ScorePolicy::PassThrough);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = ServiceConfig::load_from(
            Some(PathBuf::from("/nonexistent/predictor.toml")),
            "PREDICTOR_TEST_MISSING",
        );
        assert!(result.is_err());
    }
}
