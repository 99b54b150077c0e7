//! Library for range-scaled sales forecasting
//!
//! This crate provides the core functionality for:
//! - Loading the pretrained feature preprocessor and regressor artifacts
//! - Deriving the sales scaling range from historical data
//! - Scoring single payloads and rescaling the model output
//! - Health reporting and observability

pub mod artifacts;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use config::PredictorConfig;
pub use error::PredictError;
pub use health::{ComponentHealth, ComponentStatus, HealthResponse};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::RangeScaledPredictor;
