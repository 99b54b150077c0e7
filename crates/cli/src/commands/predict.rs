//! Single-payload prediction command

use anyhow::{Context, Result};
use forecast_lib::{Payload, RangeScaledPredictor};
use std::io::Read;
use std::path::Path;

use crate::output::{format_value, OutputFormat};

/// Score one JSON payload read from `source` (a file, or stdin for `-`/none)
pub fn predict(
    predictor: &RangeScaledPredictor,
    source: Option<&Path>,
    decimals: u32,
    format: OutputFormat,
) -> Result<()> {
    let raw = read_source(source)?;
    let payload: Payload =
        serde_json::from_str(&raw).context("Payload must be a JSON object of feature values")?;

    let prediction = predictor
        .predict_detailed(&payload)
        .context("Prediction failed")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        OutputFormat::Table => {
            println!("{}", format_value(prediction.value, decimals));
        }
    }

    Ok(())
}

fn read_source(source: Option<&Path>) -> Result<String> {
    match source {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read payload from stdin")?;
            Ok(buf)
        }
    }
}
