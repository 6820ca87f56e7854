//! Export result tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! numbers are written at full precision, not the rounded terminal form.

use std::path::Path;

use crate::domain::ResultTable;
use crate::error::AppError;

/// Write one table (header row + data rows) to a CSV file.
pub fn write_table_csv(path: &Path, table: &ResultTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(&table.headers)
        .map_err(|e| AppError::output(format!("Failed to write export CSV header: {e}")))?;

    for row in &table.rows {
        writer
            .write_record(row.iter().map(|c| c.raw()))
            .map_err(|e| AppError::output(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
