//! Scaling range derivation from the historical sales dataset
//!
//! The regressor was trained on min/max-normalized sales, so its output has
//! to be mapped back using the same bounds. The bounds come from the
//! aggregated dataset when it is usable, otherwise from the hardcoded
//! fallback. Deriving the range never fails.

use crate::config::SALES_COLUMN;
use crate::models::{RangeSource, ScalingRange};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why the dataset could not provide a range
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("file missing or empty at {0}")]
    MissingOrEmpty(PathBuf),

    #[error("'{0}' column missing or empty")]
    ColumnMissingOrEmpty(&'static str),

    #[error("non-numeric value '{value}' in '{column}' at row {row}")]
    NonNumeric {
        column: &'static str,
        row: usize,
        value: String,
    },

    #[error("non-finite value in '{column}' at row {row}")]
    NonFinite { column: &'static str, row: usize },

    #[error("row {row} has {actual} fields, header has {expected}")]
    ExtraFields {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Range computed from the dataset plus how many values backed it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRange {
    pub range: ScalingRange,
    pub rows: usize,
}

/// Resolve the scaling range, degrading to the fallback on any failure.
/// The returned source carries the fallback reason for the caller to log.
pub fn load_scaling_range(path: &Path) -> (ScalingRange, RangeSource) {
    match read_sales_range(path) {
        Ok(found) => {
            debug!(
                path = %path.display(),
                rows = found.rows,
                min = found.range.min,
                max = found.range.max,
                "Scaling range loaded from dataset"
            );
            (
                found.range,
                RangeSource::Dataset {
                    path: path.to_path_buf(),
                    rows: found.rows,
                },
            )
        }
        Err(e) => {
            let reason = match &e {
                DatasetError::MissingOrEmpty(_) | DatasetError::ColumnMissingOrEmpty(_) => {
                    e.to_string()
                }
                _ => format!("could not read {}: {}", path.display(), e),
            };
            (ScalingRange::fallback(), RangeSource::Fallback { reason })
        }
    }
}

/// Read the min and max of the `sales` column. Blank cells and short rows
/// missing the column are skipped; rows longer than the header are errors.
pub fn read_sales_range(path: &Path) -> Result<DatasetRange, DatasetError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        _ => return Err(DatasetError::MissingOrEmpty(path.to_path_buf())),
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?;
    let width = headers.len();
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == SALES_COLUMN)
        .ok_or(DatasetError::ColumnMissingOrEmpty(SALES_COLUMN))?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut rows = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(DatasetError::ExtraFields {
                row: i + 1,
                expected: width,
                actual: record.len(),
            });
        }
        let cell = match record.get(column) {
            Some(cell) if !cell.is_empty() => cell,
            _ => continue,
        };

        let value: f64 = cell.parse().map_err(|_| DatasetError::NonNumeric {
            column: SALES_COLUMN,
            row: i + 1,
            value: cell.to_string(),
        })?;

        // "nan" parses as NaN; treat it like a blank cell
        if value.is_nan() {
            continue;
        }
        if value.is_infinite() {
            return Err(DatasetError::NonFinite {
                column: SALES_COLUMN,
                row: i + 1,
            });
        }

        min = min.min(value);
        max = max.max(value);
        rows += 1;
    }

    if rows == 0 {
        return Err(DatasetError::ColumnMissingOrEmpty(SALES_COLUMN));
    }

    Ok(DatasetRange {
        range: ScalingRange { min, max },
        rows,
    })
}
