//! Range-scaled prediction engine

mod features;
mod inference;
mod output;
mod range;
mod range_scaled;

#[cfg(test)]
mod tests;

pub use features::{ColumnEncoding, ColumnSpec, ColumnTransformer, HandleUnknown};
pub use inference::{load_regressor, LinearRegressor, OnnxRegressor};
pub use output::{OutputConfig, OutputFormatter, DEFAULT_DECIMAL_PLACES, MAX_DECIMAL_PLACES};
pub use range::{load_scaling_range, read_sales_range, DatasetError, DatasetRange};
pub use range_scaled::RangeScaledPredictor;

use crate::error::PredictError;
use crate::models::Payload;

/// Preprocessing capability mapping one raw record to a feature vector
pub trait FeatureTransformer: Send + Sync {
    /// Encode a single payload
    fn transform(&self, payload: &Payload) -> Result<Vec<f32>, PredictError>;

    /// Length of every vector produced by `transform`
    fn output_width(&self) -> usize;
}

/// Trained model producing one normalized prediction per feature vector
pub trait Regressor: Send + Sync {
    /// Normalized prediction, nominally in `[0, 1]`
    fn predict(&self, features: &[f32]) -> Result<f64, PredictError>;

    /// Expected feature vector length, when the model declares one
    fn input_width(&self) -> Option<usize> {
        None
    }

    fn model_version(&self) -> &str;
}
