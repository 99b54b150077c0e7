//! Per-call prediction errors
//!
//! Startup failures (missing or corrupt artifacts) are fatal and surface as
//! `anyhow::Error`. Failures while scoring a single payload use
//! [`PredictError`] so callers can report them without tearing down the
//! predictor.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("missing required feature '{0}'")]
    MissingFeature(String),

    #[error("feature '{feature}' expected {expected}, got {actual}")]
    InvalidFeatureType {
        feature: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("feature '{feature}' has unknown category '{value}'")]
    UnknownCategory { feature: String, value: String },

    #[error("feature vector has {actual} values, model expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model produced a non-finite prediction ({0})")]
    NonFiniteOutput(f64),
}
