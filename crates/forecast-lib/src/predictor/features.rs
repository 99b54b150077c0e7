//! Feature preprocessing for ML inference
//!
//! Maps a raw payload onto the numeric feature vector the regressor was
//! trained on. The preprocessing recipe is read from a JSON artifact that
//! lists each input column with its encoding; column outputs are
//! concatenated in declaration order.

use super::FeatureTransformer;
use crate::error::PredictError;
use crate::models::{FeatureValue, Payload};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// Behavior for categories not seen during fitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Encode as all zeros
    Ignore,
}

/// Encoding applied to one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoding {
    Passthrough {
        #[serde(default)]
        fill_value: Option<f64>,
    },
    Standard {
        mean: f64,
        scale: f64,
        #[serde(default)]
        fill_value: Option<f64>,
    },
    MinMax {
        min: f64,
        max: f64,
        #[serde(default)]
        fill_value: Option<f64>,
    },
    OneHot {
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
}

impl ColumnEncoding {
    fn width(&self) -> usize {
        match self {
            ColumnEncoding::OneHot { categories, .. } => categories.len(),
            _ => 1,
        }
    }
}

/// One column of the preprocessing recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub encoding: ColumnEncoding,
}

#[derive(Debug, Clone, Deserialize)]
struct ColumnTransformerArtifact {
    #[serde(default)]
    version: Option<String>,
    columns: Vec<ColumnSpec>,
}

/// Column-wise preprocessor loaded from a JSON artifact
#[derive(Debug, Clone)]
pub struct ColumnTransformer {
    columns: Vec<ColumnSpec>,
    width: usize,
    version: String,
}

impl ColumnTransformer {
    /// Build from column specs, validating the recipe
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        Self::build(columns, None)
    }

    /// Parse the JSON preprocessor artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: ColumnTransformerArtifact =
            serde_json::from_slice(bytes).context("Failed to parse preprocessor artifact")?;
        Self::build(artifact.columns, artifact.version)
    }

    fn build(columns: Vec<ColumnSpec>, version: Option<String>) -> Result<Self> {
        if columns.is_empty() {
            anyhow::bail!("Preprocessor defines no columns");
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                anyhow::bail!("Preprocessor column '{}' declared twice", column.name);
            }
            if let ColumnEncoding::OneHot { categories, .. } = &column.encoding {
                if categories.is_empty() {
                    anyhow::bail!("One-hot column '{}' has no categories", column.name);
                }
            }
        }

        let width = columns.iter().map(|c| c.encoding.width()).sum();
        Ok(Self {
            columns,
            width,
            version: version.unwrap_or_else(|| "unversioned".to_string()),
        })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn encode_column(
        &self,
        spec: &ColumnSpec,
        value: Option<&FeatureValue>,
        out: &mut Vec<f32>,
    ) -> Result<(), PredictError> {
        match &spec.encoding {
            ColumnEncoding::Passthrough { fill_value } => {
                let x = numeric(&spec.name, value, *fill_value)?;
                out.push(x as f32);
            }
            ColumnEncoding::Standard {
                mean,
                scale,
                fill_value,
            } => {
                let x = numeric(&spec.name, value, *fill_value)?;
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                out.push(((x - mean) / scale) as f32);
            }
            ColumnEncoding::MinMax {
                min,
                max,
                fill_value,
            } => {
                let x = numeric(&spec.name, value, *fill_value)?;
                let span = if max == min { 1.0 } else { max - min };
                out.push(((x - min) / span) as f32);
            }
            ColumnEncoding::OneHot {
                categories,
                handle_unknown,
            } => {
                let value = value
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| PredictError::MissingFeature(spec.name.clone()))?;
                let label = value.as_category().ok_or(PredictError::InvalidFeatureType {
                    feature: spec.name.clone(),
                    expected: "category",
                    actual: value.kind(),
                })?;

                let hit = categories.iter().position(|c| *c == label);
                if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                    return Err(PredictError::UnknownCategory {
                        feature: spec.name.clone(),
                        value: label,
                    });
                }
                out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
            }
        }
        Ok(())
    }
}

/// Numeric view of a payload cell, substituting `fill_value` for
/// missing or null cells when one is configured.
fn numeric(
    feature: &str,
    value: Option<&FeatureValue>,
    fill_value: Option<f64>,
) -> Result<f64, PredictError> {
    match value {
        None | Some(FeatureValue::Null) => {
            fill_value.ok_or_else(|| PredictError::MissingFeature(feature.to_string()))
        }
        Some(v) => v.as_number().ok_or(PredictError::InvalidFeatureType {
            feature: feature.to_string(),
            expected: "number",
            actual: v.kind(),
        }),
    }
}

impl FeatureTransformer for ColumnTransformer {
    fn transform(&self, payload: &Payload) -> Result<Vec<f32>, PredictError> {
        let mut out = Vec::with_capacity(self.width);
        for spec in &self.columns {
            self.encode_column(spec, payload.get(&spec.name), &mut out)?;
        }

        if tracing::enabled!(tracing::Level::TRACE) {
            let ignored: Vec<&String> = payload
                .iter()
                .map(|(k, _)| k)
                .filter(|k| !self.columns.iter().any(|c| &c.name == *k))
                .collect();
            trace!(ignored = ?ignored, width = out.len(), "Payload transformed");
        }

        Ok(out)
    }

    fn output_width(&self) -> usize {
        self.width
    }
}
