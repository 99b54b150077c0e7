//! Report the loaded predictor state

use anyhow::Result;
use colored::Colorize;
use forecast_lib::artifacts::ArtifactInfo;
use forecast_lib::{HealthResponse, RangeScaledPredictor, RangeSource, ScalingRange};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{color_status, print_warning, OutputFormat};

#[derive(Serialize)]
struct InspectReport<'a> {
    model_version: &'a str,
    feature_width: usize,
    scaling_range: ScalingRange,
    range_source: &'a RangeSource,
    artifacts: &'a [ArtifactInfo],
    health: HealthResponse,
}

/// Row for health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Row for artifacts table
#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "SHA-256")]
    checksum: String,
}

pub fn inspect(predictor: &RangeScaledPredictor, format: OutputFormat) -> Result<()> {
    let report = InspectReport {
        model_version: predictor.model_version(),
        feature_width: predictor.feature_width(),
        scaling_range: predictor.scaling_range(),
        range_source: predictor.range_source(),
        artifacts: predictor.artifacts(),
        health: predictor.health(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{}", "Predictor".bold());
            println!("{}", "=".repeat(60));
            println!("Model version:  {}", report.model_version.cyan());
            println!("Feature width:  {}", report.feature_width);
            println!("Scaling range:  {}", report.scaling_range.to_string().cyan());
            match report.range_source {
                RangeSource::Dataset { path, rows } => {
                    println!("Range source:   {} ({} rows)", path.display(), rows);
                }
                RangeSource::Fallback { reason } => {
                    println!("Range source:   {}", "fallback".yellow());
                    print_warning(reason);
                }
                RangeSource::Explicit => println!("Range source:   explicit"),
            }
            println!();

            let artifacts: Vec<ArtifactRow> = report
                .artifacts
                .iter()
                .map(|a| ArtifactRow {
                    path: a.path.display().to_string(),
                    size: format!("{} B", a.size_bytes),
                    checksum: a.checksum.chars().take(16).collect(),
                })
                .collect();
            let table = tabled::Table::new(artifacts)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!();

            let mut components: Vec<ComponentRow> = report
                .health
                .components
                .iter()
                .map(|(name, health)| ComponentRow {
                    name: name.clone(),
                    status: color_status(health.status),
                    message: health.message.clone().unwrap_or_default(),
                })
                .collect();
            components.sort_by(|a, b| a.name.cmp(&b.name));
            let table = tabled::Table::new(components)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nOverall: {}", color_status(report.health.status));
        }
    }

    Ok(())
}
