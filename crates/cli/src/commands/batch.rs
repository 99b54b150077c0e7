//! Batch scoring of JSON Lines payloads
//!
//! Every line is scored on the blocking pool against one shared predictor.
//! A semaphore bounds how many run at once; results are reported in input
//! order and a bad line never stops the rest.

use anyhow::{Context, Result};
use forecast_lib::{Payload, PredictorMetrics, RangeScaledPredictor};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tabled::Tabled;
use tokio::sync::Semaphore;
use tracing::info;

use crate::output::{format_value, print_warning, OutputFormat};

/// Outcome for one input line
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Row for batch results table
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Prediction")]
    value: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Score every non-blank line of `input`
pub async fn run_batch(
    predictor: Arc<RangeScaledPredictor>,
    input: &Path,
    concurrency: usize,
    decimals: u32,
    format: OutputFormat,
    show_metrics: bool,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read batch input {}", input.display()))?;

    let results = score_lines(predictor, &contents, concurrency).await?;
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(total = results.len(), failed, "Batch scored");

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Table => {
            let rows: Vec<BatchRow> = results
                .iter()
                .map(|r| BatchRow {
                    line: r.line,
                    value: r
                        .value
                        .map(|v| format_value(v, decimals))
                        .unwrap_or_else(|| "-".to_string()),
                    error: r.error.clone().unwrap_or_default(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} payloads, {} failed", results.len(), failed);
            if failed > 0 {
                print_warning("Some payloads could not be scored");
            }
        }
    }

    if show_metrics {
        eprintln!("{}", PredictorMetrics::render());
    }

    Ok(())
}

/// Score each non-blank line concurrently, preserving input order
pub async fn score_lines(
    predictor: Arc<RangeScaledPredictor>,
    contents: &str,
    concurrency: usize,
) -> Result<Vec<BatchResult>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let raw = line.to_string();
        let predictor = Arc::clone(&predictor);
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Batch semaphore closed")?;

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = serde_json::from_str::<Payload>(&raw)
                .map_err(|e| format!("invalid payload: {}", e))
                .and_then(|payload| predictor.predict(&payload).map_err(|e| e.to_string()));

            match outcome {
                Ok(value) => BatchResult {
                    line: line_no,
                    value: Some(value),
                    error: None,
                },
                Err(error) => BatchResult {
                    line: line_no,
                    value: None,
                    error: Some(error),
                },
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.context("Scoring task panicked")?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_lib::predictor::{ColumnEncoding, ColumnSpec, ColumnTransformer, LinearRegressor};
    use forecast_lib::ScalingRange;

    fn predictor() -> Arc<RangeScaledPredictor> {
        let transformer = ColumnTransformer::new(vec![ColumnSpec {
            name: "x".to_string(),
            encoding: ColumnEncoding::Passthrough { fill_value: None },
        }])
        .unwrap();
        let regressor = LinearRegressor::new(0.0, vec![1.0], "identity");
        Arc::new(RangeScaledPredictor::new(
            transformer,
            regressor,
            ScalingRange::fallback(),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_score_lines_in_order_with_errors() {
        let input = "{\"x\": 0.5}\n\n{\"x\": \"bad\"}\nnot json\n{\"x\": 1.0}\n";
        let results = score_lines(predictor(), input, 2).await.unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].line, 1);
        assert_eq!(results[0].value, Some(2000.0));
        assert_eq!(results[1].line, 3);
        assert!(results[1].error.as_deref().unwrap().contains("expected number"));
        assert_eq!(results[2].line, 4);
        assert!(results[2].error.as_deref().unwrap().starts_with("invalid payload"));
        assert_eq!(results[3].value, Some(3000.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_payloads() {
        let input: String = (0..100)
            .map(|i| format!("{{\"x\": {}}}\n", i as f64 / 100.0))
            .collect();
        let results = score_lines(predictor(), &input, 8).await.unwrap();

        assert_eq!(results.len(), 100);
        for (i, r) in results.iter().enumerate() {
            let scaled = (i as f64 / 100.0) as f32 as f64;
            let expected = ((scaled * 2000.0 + 1000.0) * 100.0).round() / 100.0;
            assert_eq!(r.value, Some(expected), "line {}", r.line);
        }
    }
}
