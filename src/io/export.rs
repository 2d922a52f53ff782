//! Export fit results to plain-text tables and JSON.
//!
//! The parameter table is whitespace-delimited, easy to paste into notes or
//! parse with downstream scripts. The JSON export carries everything a
//! follow-up analysis needs in one machine-readable document.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FitSummary, ModelComparison};
use crate::error::AppError;

/// Complete machine-readable result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullResult {
    pub object_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_component: Option<FitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_component: Option<FitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ModelComparison>,
}

/// `parameters_<object>_<n>comp.txt` under `output_dir`.
pub fn parameter_table_path(output_dir: &Path, object_name: &str, summary: &FitSummary) -> PathBuf {
    output_dir.join(format!(
        "parameters_{}_{}comp.txt",
        sanitize(object_name),
        summary.components.as_u8()
    ))
}

/// Write one fit's parameter table.
pub fn write_parameter_table(path: &Path, summary: &FitSummary) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create table '{}': {e}", path.display())))?;
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write '{}': {e}", path.display()));

    writeln!(file, "{:<22} {:>14} {:>14} {:>14}", "parameter", "median", "upper", "lower")
        .map_err(io_err)?;
    for (name, est) in summary.names.iter().zip(summary.estimates.iter()) {
        writeln!(
            file,
            "{name:<22} {:>14.6} {:>14.6} {:>14.6}",
            est.median, est.upper, est.lower
        )
        .map_err(io_err)?;
    }
    writeln!(
        file,
        "{:<22} {:>14.6e} {:>14.6e} {:>14.6e}",
        "total_dust_mass",
        summary.total_dust_mass.median,
        summary.total_dust_mass.upper,
        summary.total_dust_mass.lower
    )
    .map_err(io_err)?;
    Ok(())
}

/// Write the full run result as pretty-printed JSON
/// (`result_<object>.json` under `output_dir`).
pub fn write_result_json(output_dir: &Path, result: &FullResult) -> Result<PathBuf, AppError> {
    let path = output_dir.join(format!("result_{}.json", sanitize(&result.object_name)));
    let file = File::create(&path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, result)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))?;
    Ok(path)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
