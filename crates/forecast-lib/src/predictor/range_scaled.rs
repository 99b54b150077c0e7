//! The load-once / predict-many predictor
//!
//! Owns the feature transformer, the regressor and the scaling range. All
//! I/O happens in [`RangeScaledPredictor::initialize`]; afterwards every
//! call only reads immutable state, so a single instance can be shared
//! across threads behind an `Arc`.

use super::inference::load_regressor;
use super::output::{OutputConfig, OutputFormatter};
use super::range::load_scaling_range;
use super::{ColumnTransformer, FeatureTransformer, Regressor};
use crate::artifacts::{load_artifact, ArtifactInfo};
use crate::config::PredictorConfig;
use crate::error::PredictError;
use crate::health::{components, ComponentHealth, HealthResponse};
use crate::models::{Payload, Prediction, RangeSource, ScalingRange};
use crate::observability::{PredictorMetrics, StructuredLogger};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Number of checksum characters appended to derived model versions
const VERSION_CHECKSUM_CHARS: usize = 12;

pub struct RangeScaledPredictor {
    transformer: Box<dyn FeatureTransformer>,
    regressor: Box<dyn Regressor>,
    range: ScalingRange,
    range_source: RangeSource,
    formatter: OutputFormatter,
    artifacts: Vec<ArtifactInfo>,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
}

impl RangeScaledPredictor {
    /// Load artifacts and derive the scaling range.
    ///
    /// Fails if either artifact is missing, corrupt, fails its checksum or
    /// the two disagree on the feature width. A missing or unusable
    /// dataset only degrades the range to the fallback.
    pub fn initialize(config: &PredictorConfig) -> Result<Self> {
        config.validate().context("Invalid predictor configuration")?;
        let logger = StructuredLogger::new(config.base_dir.display().to_string());

        let preprocessor_path = config.resolved_preprocessor_path();
        let preprocessor = load_artifact(
            &preprocessor_path,
            config.max_artifact_bytes,
            config.preprocessor_sha256.as_deref(),
        )
        .context("Failed to load feature preprocessor")?;
        let transformer = ColumnTransformer::from_json(&preprocessor.bytes).with_context(|| {
            format!("Invalid preprocessor artifact {}", preprocessor_path.display())
        })?;

        let model_path = config.resolved_model_path();
        let model = load_artifact(
            &model_path,
            config.max_artifact_bytes,
            config.model_sha256.as_deref(),
        )
        .context("Failed to load regressor")?;
        let version = derive_version(&model.info);
        let regressor = load_regressor(
            &model_path,
            &model.bytes,
            transformer.output_width(),
            &version,
        )
        .with_context(|| format!("Invalid model artifact {}", model_path.display()))?;

        if let Some(expected) = regressor.input_width() {
            if expected != transformer.output_width() {
                anyhow::bail!(
                    "Preprocessor produces {} features but model expects {}",
                    transformer.output_width(),
                    expected
                );
            }
        }

        let (range, range_source) = load_scaling_range(&config.resolved_dataset_path());
        if let RangeSource::Fallback { reason } = &range_source {
            logger.log_range_fallback(reason, &range);
        }

        info!(
            preprocessor = %preprocessor_path.display(),
            model = %model_path.display(),
            features = transformer.output_width(),
            "Artifacts loaded"
        );

        let predictor = Self {
            transformer: Box::new(transformer),
            regressor,
            range,
            range_source,
            formatter: OutputFormatter::with_config(OutputConfig {
                decimal_places: config.decimal_places,
            }),
            artifacts: vec![preprocessor.info, model.info],
            metrics: PredictorMetrics::new(),
            logger,
        };
        predictor.publish();
        Ok(predictor)
    }

    /// Assemble a predictor from already-loaded capabilities
    pub fn new(
        transformer: impl FeatureTransformer + 'static,
        regressor: impl Regressor + 'static,
        range: ScalingRange,
    ) -> Self {
        Self::from_parts(Box::new(transformer), Box::new(regressor), range, RangeSource::Explicit)
    }

    /// Assemble a predictor from boxed capabilities.
    ///
    /// Unlike `initialize`, this leaves the process-wide range and model
    /// version gauges alone, so embedded instances never overwrite what the
    /// loaded service predictor published.
    pub fn from_parts(
        transformer: Box<dyn FeatureTransformer>,
        regressor: Box<dyn Regressor>,
        range: ScalingRange,
        range_source: RangeSource,
    ) -> Self {
        Self {
            transformer,
            regressor,
            range,
            range_source,
            formatter: OutputFormatter::new(),
            artifacts: Vec::new(),
            metrics: PredictorMetrics::new(),
            logger: StructuredLogger::new("embedded"),
        }
    }

    pub fn with_output_config(mut self, config: OutputConfig) -> Self {
        self.formatter = OutputFormatter::with_config(config);
        self
    }

    /// Publish range and model version gauges. The last caller wins.
    fn publish(&self) {
        self.metrics
            .set_scaling_range(&self.range, self.range_source.is_fallback());
        self.metrics.set_model_version(self.regressor.model_version());
        self.logger
            .log_startup(self.regressor.model_version(), &self.range, &self.range_source);
    }

    /// Score one payload and return the rescaled, rounded prediction
    pub fn predict(&self, payload: &Payload) -> Result<f64, PredictError> {
        self.predict_detailed(payload).map(|p| p.value)
    }

    /// Score one payload, keeping the intermediate values
    pub fn predict_detailed(&self, payload: &Payload) -> Result<Prediction, PredictError> {
        let start = Instant::now();

        let scaled = match self.score(payload) {
            Ok(scaled) => scaled,
            Err(e) => {
                self.metrics.inc_prediction_errors();
                self.logger.log_prediction_failed(&e.to_string());
                return Err(e);
            }
        };

        let value = self.formatter.format(scaled, &self.range);
        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
        self.metrics.inc_predictions();
        self.logger.log_prediction(scaled, value, elapsed.as_micros());

        Ok(Prediction {
            value,
            scaled_prediction: scaled,
            range: self.range,
            model_version: self.regressor.model_version().to_string(),
            generated_at: chrono::Utc::now().timestamp(),
        })
    }

    fn score(&self, payload: &Payload) -> Result<f64, PredictError> {
        let features = self.transformer.transform(payload)?;
        let scaled = self.regressor.predict(&features)?;
        if !scaled.is_finite() {
            return Err(PredictError::NonFiniteOutput(scaled));
        }
        Ok(scaled)
    }

    pub fn scaling_range(&self) -> ScalingRange {
        self.range
    }

    pub fn range_source(&self) -> &RangeSource {
        &self.range_source
    }

    pub fn model_version(&self) -> &str {
        self.regressor.model_version()
    }

    pub fn feature_width(&self) -> usize {
        self.transformer.output_width()
    }

    /// Metadata of the artifacts loaded by `initialize`
    pub fn artifacts(&self) -> &[ArtifactInfo] {
        &self.artifacts
    }

    pub fn health(&self) -> HealthResponse {
        let mut map = HashMap::new();
        map.insert(components::TRANSFORMER.to_string(), ComponentHealth::healthy());
        map.insert(components::REGRESSOR.to_string(), ComponentHealth::healthy());
        let range_health = match &self.range_source {
            RangeSource::Fallback { reason } => {
                ComponentHealth::degraded(format!("fallback range in use: {}", reason))
            }
            _ => ComponentHealth::healthy(),
        };
        map.insert(components::SCALING_RANGE.to_string(), range_health);
        HealthResponse::from_components(map)
    }
}

/// `<file stem>-<checksum prefix>`, e.g. `xgb_model-3f2a9c01b7de`
fn derive_version(info: &ArtifactInfo) -> String {
    let stem = info
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let short = &info.checksum[..VERSION_CHECKSUM_CHARS.min(info.checksum.len())];
    format!("{}-{}", stem, short)
}
