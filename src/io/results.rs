//! Write analysis results as JSON.
//!
//! The JSON file is the machine-readable record of a run: which experiment,
//! which inputs, which rows were skipped, and the full analysis struct.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{ExperimentKind, RowError};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ResultsFile<'a, T: Serialize> {
    pub tool: &'static str,
    pub version: &'static str,
    pub experiment: ExperimentKind,
    pub generated_at: DateTime<Local>,
    pub inputs: &'a [PathBuf],
    pub row_errors: &'a [RowError],
    pub results: &'a T,
}

impl<'a, T: Serialize> ResultsFile<'a, T> {
    pub fn new(experiment: ExperimentKind, inputs: &'a [PathBuf], row_errors: &'a [RowError], results: &'a T) -> Self {
        Self {
            tool: "labfit",
            version: env!("CARGO_PKG_VERSION"),
            experiment,
            generated_at: Local::now(),
            inputs,
            row_errors,
            results,
        }
    }
}

/// Write a results JSON file (pretty-printed).
pub fn write_results_json<T: Serialize>(path: &Path, file: &ResultsFile<'_, T>) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::output(format!("Failed to write results JSON '{}': {e}", path.display())))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
