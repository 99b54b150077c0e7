//! Core data models for the sales forecaster

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Lower bound used when the historical dataset is unusable
pub const FALLBACK_RANGE_MIN: f64 = 1000.0;

/// Upper bound used when the historical dataset is unusable
pub const FALLBACK_RANGE_MAX: f64 = 3000.0;

/// A single cell of an input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Numeric view of the value. Booleans map to 1/0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Category label view of the value
    pub fn as_category(&self) -> Option<String> {
        match self {
            FeatureValue::Text(s) => Some(s.clone()),
            FeatureValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(format!("{}", *n as i64))
            }
            FeatureValue::Number(n) => Some(n.to_string()),
            FeatureValue::Bool(b) => Some(b.to_string()),
            FeatureValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    /// Short type name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Null => "null",
            FeatureValue::Bool(_) => "bool",
            FeatureValue::Number(_) => "number",
            FeatureValue::Text(_) => "text",
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

/// One input record to score: feature name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, FeatureValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Observed `[min, max]` of historical sales used to undo target scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingRange {
    pub min: f64,
    pub max: f64,
}

impl ScalingRange {
    /// Build a validated range. Bounds must be finite and `min <= max`.
    pub fn new(min: f64, max: f64) -> Result<Self, InvalidRange> {
        if !min.is_finite() || !max.is_finite() {
            return Err(InvalidRange { min, max });
        }
        if min > max {
            return Err(InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// The hardcoded range used when no usable dataset exists
    pub const fn fallback() -> Self {
        Self {
            min: FALLBACK_RANGE_MIN,
            max: FALLBACK_RANGE_MAX,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map a normalized model output back onto the original scale
    pub fn denormalize(&self, scaled: f64) -> f64 {
        scaled * self.span() + self.min
    }
}

impl Default for ScalingRange {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for ScalingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Rejected explicit range bounds
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid scaling range: min={min}, max={max}")]
pub struct InvalidRange {
    pub min: f64,
    pub max: f64,
}

/// Where the active scaling range came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RangeSource {
    /// Computed from the `sales` column of the historical dataset
    Dataset { path: PathBuf, rows: usize },
    /// Dataset unusable, hardcoded bounds in effect
    Fallback { reason: String },
    /// Supplied directly by the caller
    Explicit,
}

impl RangeSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RangeSource::Fallback { .. })
    }
}

/// Detailed result of scoring one payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Rescaled prediction rounded for display
    pub value: f64,
    /// Raw regressor output before rescaling
    pub scaled_prediction: f64,
    pub range: ScalingRange,
    pub model_version: String,
    pub generated_at: i64,
}
