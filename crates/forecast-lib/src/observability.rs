//! Observability infrastructure for the predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, counters, scaling range, model version)
//! - Structured logging with tracing

use crate::models::{RangeSource, ScalingRange};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    scaling_range: GaugeVec,
    scaling_range_fallback: IntGauge,
    model_version_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "sales_forecast_prediction_latency_seconds",
                "Time spent transforming and scoring a single payload",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "sales_forecast_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "sales_forecast_prediction_errors_total",
                "Total number of failed predictions"
            )
            .expect("Failed to register prediction_errors_total"),

            scaling_range: register_gauge_vec!(
                "sales_forecast_scaling_range",
                "Bounds of the active sales scaling range",
                &["bound"]
            )
            .expect("Failed to register scaling_range"),

            scaling_range_fallback: register_int_gauge!(
                "sales_forecast_scaling_range_fallback",
                "1 when the hardcoded fallback range is in use"
            )
            .expect("Failed to register scaling_range_fallback"),

            model_version_info: register_gauge_vec!(
                "sales_forecast_model_version_info",
                "Information about the currently loaded regressor",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn predictions(&self) -> u64 {
        self.inner().predictions_total.get()
    }

    pub fn prediction_errors(&self) -> u64 {
        self.inner().prediction_errors_total.get()
    }

    /// Publish the active scaling range
    pub fn set_scaling_range(&self, range: &ScalingRange, fallback: bool) {
        let gauge = &self.inner().scaling_range;
        gauge.with_label_values(&["min"]).set(range.min);
        gauge.with_label_values(&["max"]).set(range.max);
        self.inner().scaling_range_fallback.set(i64::from(fallback));
    }

    /// Update model version info
    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }

    /// Render every registered metric in Prometheus text format
    pub fn render() -> String {
        use prometheus::{Encoder, TextEncoder};

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for predictor events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log predictor startup
    pub fn log_startup(&self, model_version: &str, range: &ScalingRange, source: &RangeSource) {
        info!(
            event = "predictor_started",
            instance = %self.instance,
            model_version = %model_version,
            range_min = range.min,
            range_max = range.max,
            range_fallback = source.is_fallback(),
            "Range-scaled predictor initialized"
        );
    }

    /// Log use of the fallback scaling range
    pub fn log_range_fallback(&self, reason: &str, range: &ScalingRange) {
        warn!(
            event = "scaling_range_fallback",
            instance = %self.instance,
            reason = %reason,
            range_min = range.min,
            range_max = range.max,
            "Using default scaling range"
        );
    }

    pub fn log_prediction(&self, scaled: f64, value: f64, elapsed_us: u128) {
        debug!(
            event = "prediction_generated",
            instance = %self.instance,
            scaled_prediction = scaled,
            value = value,
            elapsed_us = elapsed_us,
            "Generated sales prediction"
        );
    }

    pub fn log_prediction_failed(&self, error: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            error = %error,
            "Prediction failed"
        );
    }
}
