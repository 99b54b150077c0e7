//! Scenario tests for the range-scaled predictor
//!
//! Mock capabilities pin the regressor output so rescaling can be checked
//! exactly; the initialization tests build real artifacts in a temp dir.

#[cfg(test)]
mod mock_predictor_tests {
    use crate::error::PredictError;
    use crate::models::{Payload, RangeSource, ScalingRange};
    use crate::observability::PredictorMetrics;
    use crate::predictor::{FeatureTransformer, LinearRegressor, RangeScaledPredictor, Regressor};
    use std::sync::Arc;

    /// Passes the `x` feature straight through
    struct IdentityTransformer;

    impl FeatureTransformer for IdentityTransformer {
        fn transform(&self, payload: &Payload) -> Result<Vec<f32>, PredictError> {
            let x = payload
                .get("x")
                .ok_or_else(|| PredictError::MissingFeature("x".to_string()))?
                .as_number()
                .ok_or(PredictError::InvalidFeatureType {
                    feature: "x".to_string(),
                    expected: "number",
                    actual: "text",
                })?;
            Ok(vec![x as f32])
        }

        fn output_width(&self) -> usize {
            1
        }
    }

    /// Returns the first feature as the scaled prediction
    struct EchoRegressor;

    impl Regressor for EchoRegressor {
        fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
            features
                .first()
                .map(|x| f64::from(*x))
                .ok_or_else(|| PredictError::Inference("empty input".to_string()))
        }

        fn model_version(&self) -> &str {
            "echo"
        }
    }

    fn predictor(range: ScalingRange) -> RangeScaledPredictor {
        RangeScaledPredictor::new(IdentityTransformer, EchoRegressor, range)
    }

    fn x(value: f64) -> Payload {
        Payload::new().with("x", value)
    }

    #[test]
    fn test_rescale_correctness() {
        let p = predictor(ScalingRange::fallback());
        assert_eq!(p.predict(&x(0.5)).unwrap(), 2000.0);
        assert_eq!(p.predict(&x(0.0)).unwrap(), 1000.0);
        assert_eq!(p.predict(&x(1.0)).unwrap(), 3000.0);
    }

    #[test]
    fn test_rounding_of_rescaled_value() {
        // 0.1234567 * 10000 ~= 1234.567
        let p = predictor(ScalingRange::new(0.0, 10000.0).unwrap());
        let value = p.predict(&x(0.1234567)).unwrap();
        assert_eq!(value, 1234.57);
    }

    #[test]
    fn test_wide_range_keeps_regressor_precision() {
        // 0.1 does not survive a round trip through f32 (0.100000001...)
        let p = RangeScaledPredictor::new(
            IdentityTransformer,
            LinearRegressor::new(0.1, vec![0.0], "lin"),
            ScalingRange::new(0.0, 1e7).unwrap(),
        );
        assert_eq!(p.predict(&x(0.0)).unwrap(), 1_000_000.0);
    }

    #[test]
    fn test_determinism() {
        let p = predictor(ScalingRange::new(1200.0, 2800.0).unwrap());
        let payload = x(0.37);
        let first = p.predict(&payload).unwrap();
        let second = p.predict(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_propagation_leaves_state_untouched() {
        let p = predictor(ScalingRange::new(1200.0, 2800.0).unwrap());

        let err = p.predict(&Payload::new().with("y", 1.0)).unwrap_err();
        assert_eq!(err, PredictError::MissingFeature("x".to_string()));

        assert_eq!(p.scaling_range(), ScalingRange::new(1200.0, 2800.0).unwrap());
        assert_eq!(p.predict(&x(0.5)).unwrap(), 2000.0);
    }

    #[test]
    fn test_non_finite_output_is_an_error() {
        let p = predictor(ScalingRange::fallback());
        let err = p.predict(&x(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, PredictError::NonFiniteOutput(_)));
    }

    #[test]
    fn test_predict_detailed_fields() {
        let p = predictor(ScalingRange::fallback());
        let prediction = p.predict_detailed(&x(0.25)).unwrap();

        assert_eq!(prediction.value, 1500.0);
        assert_eq!(prediction.scaled_prediction, 0.25);
        assert_eq!(prediction.range, ScalingRange::fallback());
        assert_eq!(prediction.model_version, "echo");
        assert!(prediction.generated_at > 0);
    }

    #[test]
    fn test_embedded_predictor_leaves_range_gauges_alone() {
        let p = predictor(ScalingRange::new(-4321.5, -1234.5).unwrap());
        assert_eq!(p.predict(&x(0.0)).unwrap(), -4321.5);

        let rendered = PredictorMetrics::render();
        assert!(!rendered.contains("-4321.5"));
        assert!(!rendered.contains("-1234.5"));
    }

    #[test]
    fn test_explicit_range_is_healthy() {
        let p = predictor(ScalingRange::fallback());
        assert_eq!(p.range_source(), &RangeSource::Explicit);
        assert_eq!(p.health().status, crate::health::ComponentStatus::Healthy);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_predictions_are_independent() {
        let p = Arc::new(predictor(ScalingRange::new(0.0, 1000.0).unwrap()));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let p = Arc::clone(&p);
                tokio::task::spawn_blocking(move || {
                    let scaled = i as f64 / 64.0;
                    (i, p.predict(&x(scaled)))
                })
            })
            .collect();

        for handle in handles {
            let (i, result) = handle.await.unwrap();
            let expected = ((i as f64 / 64.0) * 1000.0 * 100.0).round() / 100.0;
            assert_eq!(result.unwrap(), expected, "payload {} mismatched", i);
        }
    }
}

#[cfg(test)]
mod initialization_tests {
    use crate::artifacts::compute_checksum;
    use crate::config::PredictorConfig;
    use crate::health::{components, ComponentStatus};
    use crate::models::{Payload, RangeSource, ScalingRange};
    use crate::predictor::RangeScaledPredictor;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const PREPROCESSOR: &str = r#"{
        "version": "pre-1",
        "columns": [
            {"name": "store", "kind": "one_hot", "categories": ["A", "B"]},
            {"name": "promo", "kind": "passthrough"}
        ]
    }"#;

    const LINEAR_MODEL: &str =
        r#"{"version": "linear-1", "intercept": 0.25, "coefficients": [0.0, 0.25, 0.5]}"#;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Default layout with a JSON linear model in place of the ONNX one
    fn setup(dir: &TempDir, dataset: Option<&str>) -> PredictorConfig {
        let mut config = PredictorConfig::with_base_dir(dir.path());
        config.model_path = "model/linear_model.json".into();

        write(&config.resolved_preprocessor_path(), PREPROCESSOR);
        write(&config.resolved_model_path(), LINEAR_MODEL);
        if let Some(csv) = dataset {
            write(&config.resolved_dataset_path(), csv);
        }
        config
    }

    fn payload(store: &str, promo: f64) -> Payload {
        Payload::new().with("store", store).with("promo", promo)
    }

    #[test]
    fn test_initialize_with_dataset_range() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, Some("store,sales\nA,1200\nB,1500\nA,2800\n"));

        let p = RangeScaledPredictor::initialize(&config).unwrap();
        assert_eq!(p.scaling_range(), ScalingRange { min: 1200.0, max: 2800.0 });
        assert!(matches!(p.range_source(), RangeSource::Dataset { rows: 3, .. }));
        assert_eq!(p.model_version(), "linear-1");
        assert_eq!(p.feature_width(), 3);
        assert_eq!(p.artifacts().len(), 2);

        // store B, promo 1 -> 0.25 + 0.25 + 0.5 = 1.0
        assert_eq!(p.predict(&payload("B", 1.0)).unwrap(), 2800.0);
        // store A, promo 0 -> 0.25
        assert_eq!(p.predict(&payload("A", 0.0)).unwrap(), 1600.0);
        assert_eq!(p.health().status, ComponentStatus::Healthy);
    }

    #[test]
    fn test_initialize_without_dataset_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, None);

        let p = RangeScaledPredictor::initialize(&config).unwrap();
        assert_eq!(p.scaling_range(), ScalingRange::fallback());
        assert!(p.range_source().is_fallback());

        let health = p.health();
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::SCALING_RANGE].status,
            ComponentStatus::Degraded
        );
        assert_eq!(p.predict(&payload("A", 0.0)).unwrap(), 1500.0);
    }

    #[test]
    fn test_initialize_fails_without_preprocessor() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, None);
        fs::remove_file(config.resolved_preprocessor_path()).unwrap();

        let err = RangeScaledPredictor::initialize(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("preprocessor"));
    }

    #[test]
    fn test_initialize_fails_without_model() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, None);
        fs::remove_file(config.resolved_model_path()).unwrap();

        assert!(RangeScaledPredictor::initialize(&config).is_err());
    }

    #[test]
    fn test_initialize_fails_on_corrupt_model() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, None);
        write(&config.resolved_model_path(), "{ not json");

        assert!(RangeScaledPredictor::initialize(&config).is_err());
    }

    #[test]
    fn test_initialize_checks_artifact_checksum() {
        let dir = TempDir::new().unwrap();
        let mut config = setup(&dir, None);

        config.model_sha256 = Some(compute_checksum(LINEAR_MODEL.as_bytes()));
        assert!(RangeScaledPredictor::initialize(&config).is_ok());

        config.model_sha256 = Some(compute_checksum(b"something else"));
        let err = RangeScaledPredictor::initialize(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("Checksum mismatch"));
    }

    #[test]
    fn test_initialize_rejects_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir, None);
        write(
            &config.resolved_model_path(),
            r#"{"intercept": 0.0, "coefficients": [1.0, 1.0]}"#,
        );

        let err = RangeScaledPredictor::initialize(&config).err().unwrap();
        assert!(err.to_string().contains("model expects 2"));
    }

    #[test]
    fn test_initialize_rejects_unknown_model_format() {
        let dir = TempDir::new().unwrap();
        let mut config = setup(&dir, None);
        config.model_path = "model/xgb_model.joblib".into();
        write(&config.resolved_model_path(), "opaque");

        assert!(RangeScaledPredictor::initialize(&config).is_err());
    }

    #[test]
    fn test_decimal_places_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = setup(&dir, Some("sales\n0\n3\n"));
        config.decimal_places = 1;

        let p = RangeScaledPredictor::initialize(&config).unwrap();
        // 0.25 * 3 = 0.75 -> 0.8 with one decimal
        assert_eq!(p.predict(&payload("A", 0.0)).unwrap(), 0.8);
    }

    #[test]
    fn test_initialize_rejects_excessive_decimal_places() {
        let dir = TempDir::new().unwrap();
        let mut config = setup(&dir, None);
        config.decimal_places = 400;

        let err = RangeScaledPredictor::initialize(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("decimal_places must be at most 15"));
    }
}
