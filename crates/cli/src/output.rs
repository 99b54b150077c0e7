//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use forecast_lib::ComponentStatus;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message to stderr, keeping stdout for command output
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a prediction with the configured number of decimals
pub fn format_value(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, value)
}

/// Color status based on value
pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => status.as_str().green().to_string(),
        ComponentStatus::Degraded => status.as_str().yellow().to_string(),
    }
}
