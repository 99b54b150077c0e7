//! Configuration management for the CLI
//!
//! Layers, lowest precedence first: built-in defaults, a TOML file
//! (`--config`, else `~/.config/sales-forecast/config.toml` when present),
//! `FORECAST_*` environment variables, then command-line overrides.

use anyhow::{Context, Result};
use forecast_lib::PredictorConfig;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `FORECAST_BASE_DIR`
pub const ENV_PREFIX: &str = "FORECAST";

/// Load predictor configuration from file and environment
pub fn load(explicit_file: Option<&Path>, base_dir: Option<&Path>) -> Result<PredictorConfig> {
    let mut builder = config::Config::builder();

    match explicit_file {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path().filter(|p| p.exists()) {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

    let mut predictor_config: PredictorConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    if let Some(dir) = base_dir {
        predictor_config.base_dir = dir.to_path_buf();
    }

    Ok(predictor_config)
}

/// Get the configuration file path
fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| {
        home.join(".config")
            .join("sales-forecast")
            .join("config.toml")
    })
}
