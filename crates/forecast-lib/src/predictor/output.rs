//! Prediction output post-processing
//!
//! Handles conversion of the raw regressor output back onto the sales
//! scale and rounding for display.

use crate::models::ScalingRange;

/// Decimal places kept by default
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;

/// Upper bound on decimal places; an f64 carries at most ~15 significant digits
pub const MAX_DECIMAL_PLACES: u32 = 15;

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Number of decimal digits kept in returned predictions
    pub decimal_places: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

/// Rescales and rounds raw model outputs
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self {
            config: OutputConfig::default(),
        }
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    /// `scaled * (max - min) + min`, rounded
    pub fn format(&self, scaled: f64, range: &ScalingRange) -> f64 {
        self.round(range.denormalize(scaled))
    }

    /// Round to the configured number of decimals, half away from zero.
    /// Settings above `MAX_DECIMAL_PLACES` round at that precision.
    pub fn round(&self, value: f64) -> f64 {
        let places = self.config.decimal_places.min(MAX_DECIMAL_PLACES);
        let factor = 10f64.powi(places as i32);
        (value * factor).round() / factor
    }

    pub fn decimal_places(&self) -> u32 {
        self.config.decimal_places
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}
