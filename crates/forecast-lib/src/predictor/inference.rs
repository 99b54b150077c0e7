//! Regressor implementations
//!
//! `OnnxRegressor` runs an exported gradient-boosted model through tract.
//! `LinearRegressor` evaluates a plain coefficient vector, which is handy
//! for baseline models and for exercising the pipeline without ONNX files.

use super::Regressor;
use crate::error::PredictError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX regressor using tract for lightweight inference
pub struct OnnxRegressor {
    model: TractModel,
    input_width: usize,
    version: String,
}

impl OnnxRegressor {
    /// Load and optimize an ONNX model expecting `[1, input_width]` f32 input
    pub fn from_bytes(model_bytes: &[u8], input_width: usize, version: impl Into<String>) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, input_width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            input_width,
            version: version.into(),
        })
    }

    fn features_to_tensor(&self, features: &[f32]) -> Result<Tensor, PredictError> {
        tract_ndarray::Array2::from_shape_vec((1, self.input_width), features.to_vec())
            .map(Into::into)
            .map_err(|e| PredictError::Inference(e.to_string()))
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
        check_width(self.input_width, features)?;

        let start = std::time::Instant::now();
        let input = self.features_to_tensor(features)?;

        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let output = result
            .first()
            .ok_or_else(|| PredictError::Inference("model produced no output".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let value = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| PredictError::Inference("model output is empty".to_string()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", SLOW_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(f64::from(value))
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.input_width)
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

#[derive(Debug, Deserialize)]
struct LinearArtifact {
    #[serde(default)]
    version: Option<String>,
    intercept: f64,
    coefficients: Vec<f64>,
}

/// Linear model `intercept + coefficients · features`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    intercept: f64,
    coefficients: Vec<f64>,
    version: String,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>, version: impl Into<String>) -> Self {
        Self {
            intercept,
            coefficients,
            version: version.into(),
        }
    }

    /// Parse the JSON model artifact. `default_version` is used when the
    /// artifact carries no version of its own.
    pub fn from_json(bytes: &[u8], default_version: impl Into<String>) -> Result<Self> {
        let artifact: LinearArtifact =
            serde_json::from_slice(bytes).context("Failed to parse linear model artifact")?;
        if artifact.coefficients.is_empty() {
            anyhow::bail!("Linear model has no coefficients");
        }
        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            anyhow::bail!("Linear model contains non-finite weights");
        }
        Ok(Self {
            intercept: artifact.intercept,
            coefficients: artifact.coefficients,
            version: artifact.version.unwrap_or_else(|| default_version.into()),
        })
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
        check_width(self.coefficients.len(), features)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * f64::from(*x))
            .sum();
        Ok(self.intercept + dot)
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

fn check_width(expected: usize, features: &[f32]) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::WidthMismatch {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Build a regressor from artifact bytes, dispatching on file extension
pub fn load_regressor(
    path: &Path,
    bytes: &[u8],
    input_width: usize,
    version: &str,
) -> Result<Box<dyn Regressor>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("onnx") => Ok(Box::new(OnnxRegressor::from_bytes(bytes, input_width, version)?)),
        Some("json") => Ok(Box::new(LinearRegressor::from_json(bytes, version)?)),
        _ => anyhow::bail!(
            "Unsupported model artifact {} (expected .onnx or .json)",
            path.display()
        ),
    }
}
