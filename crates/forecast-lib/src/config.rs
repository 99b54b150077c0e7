//! Predictor configuration

use crate::predictor::{DEFAULT_DECIMAL_PLACES, MAX_DECIMAL_PLACES};
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Relative location of the preprocessor artifact under the base directory
pub const DEFAULT_PREPROCESSOR_PATH: &str = "model/preprocessor.json";

/// Relative location of the regressor artifact under the base directory
pub const DEFAULT_MODEL_PATH: &str = "model/xgb_model.onnx";

/// Relative location of the aggregated historical dataset
pub const DEFAULT_DATASET_PATH: &str = "notebook/data/aggregated_data.csv";

/// Column holding the historical target values
pub const SALES_COLUMN: &str = "sales";

/// Maximum accepted artifact size (64MB)
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Where to find artifacts and how to validate them
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Directory every relative path is resolved against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_preprocessor_path")]
    pub preprocessor_path: PathBuf,

    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Expected SHA-256 (hex) of the preprocessor artifact
    #[serde(default)]
    pub preprocessor_sha256: Option<String>,

    /// Expected SHA-256 (hex) of the regressor artifact
    #[serde(default)]
    pub model_sha256: Option<String>,

    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,

    /// Decimal places kept in returned predictions
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_preprocessor_path() -> PathBuf {
    PathBuf::from(DEFAULT_PREPROCESSOR_PATH)
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_PATH)
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_ARTIFACT_BYTES
}

fn default_decimal_places() -> u32 {
    DEFAULT_DECIMAL_PLACES
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            preprocessor_path: default_preprocessor_path(),
            model_path: default_model_path(),
            dataset_path: default_dataset_path(),
            preprocessor_sha256: None,
            model_sha256: None,
            max_artifact_bytes: default_max_artifact_bytes(),
            decimal_places: default_decimal_places(),
        }
    }
}

impl PredictorConfig {
    /// Default layout rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Reject settings the predictor cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            anyhow::bail!(
                "decimal_places must be at most {}, got {}",
                MAX_DECIMAL_PLACES,
                self.decimal_places
            );
        }
        if self.max_artifact_bytes == 0 {
            anyhow::bail!("max_artifact_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn resolved_preprocessor_path(&self) -> PathBuf {
        self.resolve(&self.preprocessor_path)
    }

    pub fn resolved_model_path(&self) -> PathBuf {
        self.resolve(&self.model_path)
    }

    pub fn resolved_dataset_path(&self) -> PathBuf {
        self.resolve(&self.dataset_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = PredictorConfig::with_base_dir("/srv/forecast");
        assert_eq!(
            config.resolved_preprocessor_path(),
            PathBuf::from("/srv/forecast/model/preprocessor.json")
        );
        assert_eq!(
            config.resolved_model_path(),
            PathBuf::from("/srv/forecast/model/xgb_model.onnx")
        );
        assert_eq!(
            config.resolved_dataset_path(),
            PathBuf::from("/srv/forecast/notebook/data/aggregated_data.csv")
        );
        assert_eq!(config.decimal_places, 2);
    }

    #[test]
    fn test_absolute_override_not_rebased() {
        let mut config = PredictorConfig::with_base_dir("/srv/forecast");
        config.model_path = PathBuf::from("/opt/models/model.json");
        assert_eq!(config.resolved_model_path(), PathBuf::from("/opt/models/model.json"));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: PredictorConfig =
            serde_json::from_str(r#"{"base_dir": "/data", "model_sha256": "abc"}"#).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/data"));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.model_sha256.as_deref(), Some("abc"));
        assert_eq!(config.max_artifact_bytes, DEFAULT_MAX_ARTIFACT_BYTES);
    }

    #[test]
    fn test_validate_decimal_places() {
        let mut config = PredictorConfig::default();
        assert!(config.validate().is_ok());

        config.decimal_places = MAX_DECIMAL_PLACES;
        assert!(config.validate().is_ok());

        config.decimal_places = 400;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("decimal_places"));
    }

    #[test]
    fn test_validate_rejects_zero_artifact_limit() {
        let mut config = PredictorConfig::default();
        config.max_artifact_bytes = 0;
        assert!(config.validate().is_err());
    }
}
