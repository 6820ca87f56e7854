//! CSV ingest and normalization.
//!
//! This module turns the lab's measurement sheets (exported as CSV) into clean,
//! typed rows that are safe to analyze.
//!
//! Design goals:
//! - **Header-based schema** with a few aliases per column (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no physics here beyond "is this value usable"

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use log::warn;

use crate::domain::{EmfReading, RowError, SolutionRow, VaporRow};
use crate::error::AppError;

const CONCENTRATION_COLUMNS: &[&str] = &["c", "c/(mol/l)", "c (mol/l)", "concentration", "concentration (mol/l)"];
const TEMPERATURE_COLUMNS: &[&str] = &["t/℃", "t/°c", "t_c", "t", "temperature", "temperature/℃"];
const P0_COLUMNS: &[&str] = &["p0/kpa", "p0", "p0_kpa"];
const GAUGE_COLUMNS: &[&str] = &["p表/kpa", "p_gauge/kpa", "p_gauge", "p_gauge_kpa", "gauge/kpa"];
const E_ZN_HG_COLUMNS: &[&str] = &["e_zn_hg", "e(zn-hg)", "zn_hg"];
const E_CU_ZN_COLUMNS: &[&str] = &["e_cu_zn", "e(cu-zn)", "cu_zn"];
const E_CU_HG_COLUMNS: &[&str] = &["e_cu_hg", "e(cu-hg)", "cu_hg"];

/// Rows that survived validation plus what was skipped.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl<T> Ingested<T> {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// A parsed CSV sheet: normalized header lookup + records with their line numbers.
struct Sheet {
    header_map: HashMap<String, usize>,
    headers: Vec<String>,
    records: Vec<(usize, StringRecord)>,
    row_errors: Vec<RowError>,
}

impl Sheet {
    fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header_record = reader
            .headers()
            .map_err(|e| AppError::input(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
            .clone();
        let headers: Vec<String> = header_record.iter().map(normalize_header_name).collect();
        let header_map = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut records = Vec::new();
        let mut row_errors = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // +2 because records() starts after the header and lines are 1-based.
            let line = idx + 2;
            match result {
                Ok(record) if record.iter().all(str::is_empty) => {}
                Ok(record) => records.push((line, record)),
                Err(e) => row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                }),
            }
        }

        Ok(Self {
            header_map,
            headers,
            records,
            row_errors,
        })
    }

    fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|name| self.header_map.get(*name).copied())
    }

    fn require_column(&self, aliases: &[&str], path: &Path) -> Result<usize, AppError> {
        self.find_column(aliases).ok_or_else(|| {
            AppError::input(format!(
                "'{}' is missing a required column (one of: {}).",
                path.display(),
                aliases.join(", ")
            ))
        })
    }

    /// Replicate reading columns: every header starting with `dp` or `Δp`.
    fn replicate_columns(&self, path: &Path) -> Result<Vec<usize>, AppError> {
        let cols: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with("dp") || h.starts_with("δp") || h.starts_with("Δp"))
            .map(|(idx, _)| idx)
            .collect();
        if cols.is_empty() {
            return Err(AppError::input(format!(
                "'{}' has no replicate reading columns (headers starting with `dp` or `Δp`).",
                path.display()
            )));
        }
        Ok(cols)
    }
}

/// Load the pure-water manometer readings (every `dp*` cell of every row).
pub fn load_water_readings(path: &Path) -> Result<Ingested<f64>, AppError> {
    let sheet = Sheet::open(path)?;
    let cols = sheet.replicate_columns(path)?;

    let mut rows = Vec::new();
    let mut row_errors = sheet.row_errors.clone();
    for (line, record) in &sheet.records {
        for &col in &cols {
            match get_cell(record, col) {
                None => {}
                Some(raw) => match parse_f64(raw) {
                    Some(v) => rows.push(v),
                    None => row_errors.push(RowError {
                        line: *line,
                        message: format!("Invalid reading '{raw}'."),
                    }),
                },
            }
        }
    }

    finish(path, rows, row_errors, sheet.records.len())
}

/// Load the solution table: concentration plus replicate readings per row.
pub fn load_solution_table(path: &Path) -> Result<Ingested<SolutionRow>, AppError> {
    let sheet = Sheet::open(path)?;
    let c_col = sheet.require_column(CONCENTRATION_COLUMNS, path)?;
    let cols = sheet.replicate_columns(path)?;

    let mut rows = Vec::new();
    let mut row_errors = sheet.row_errors.clone();
    for (line, record) in &sheet.records {
        match parse_solution_row(record, c_col, &cols) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line: *line, message }),
        }
    }

    finish(path, rows, row_errors, sheet.records.len())
}

/// Load an ordered temperature trace.
///
/// Readings are positional (the reading index is the time axis), so an invalid
/// cell is an input error rather than a skipped row.
pub fn load_temperature_series(path: &Path) -> Result<Vec<f64>, AppError> {
    let sheet = Sheet::open(path)?;
    if let Some(err) = sheet.row_errors.first() {
        return Err(AppError::input(format!(
            "'{}' line {}: {}",
            path.display(),
            err.line,
            err.message
        )));
    }
    let col = sheet.require_column(TEMPERATURE_COLUMNS, path)?;

    let mut out = Vec::with_capacity(sheet.records.len());
    for (line, record) in &sheet.records {
        let raw = get_cell(record, col).ok_or_else(|| {
            AppError::input(format!("'{}' line {line}: missing temperature reading.", path.display()))
        })?;
        let value = parse_f64(raw).ok_or_else(|| {
            AppError::input(format!("'{}' line {line}: invalid temperature '{raw}'.", path.display()))
        })?;
        out.push(value);
    }

    if out.is_empty() {
        return Err(AppError::data(format!("'{}' contains no temperature readings.", path.display())));
    }
    Ok(out)
}

/// Load repeated cell voltage readings.
pub fn load_emf_readings(path: &Path) -> Result<Ingested<EmfReading>, AppError> {
    let sheet = Sheet::open(path)?;
    let zn_hg = sheet.require_column(E_ZN_HG_COLUMNS, path)?;
    let cu_zn = sheet.require_column(E_CU_ZN_COLUMNS, path)?;
    let cu_hg = sheet.require_column(E_CU_HG_COLUMNS, path)?;

    let mut rows = Vec::new();
    let mut row_errors = sheet.row_errors.clone();
    for (line, record) in &sheet.records {
        let values = [zn_hg, cu_zn, cu_hg].map(|col| get_cell(record, col).and_then(parse_f64));
        match values {
            [Some(e_zn_hg), Some(e_cu_zn), Some(e_cu_hg)] => rows.push(EmfReading {
                e_zn_hg,
                e_cu_zn,
                e_cu_hg,
            }),
            _ => row_errors.push(RowError {
                line: *line,
                message: "Incomplete or invalid voltage readings.".to_string(),
            }),
        }
    }

    finish(path, rows, row_errors, sheet.records.len())
}

/// Load the vapor pressure table.
///
/// Rows whose vapor pressure `p0 - gauge` is not positive are skipped.
pub fn load_vapor_pressure(path: &Path) -> Result<Ingested<VaporRow>, AppError> {
    let sheet = Sheet::open(path)?;
    let t_col = sheet.require_column(TEMPERATURE_COLUMNS, path)?;
    let p0_col = sheet.require_column(P0_COLUMNS, path)?;
    let gauge_col = sheet.require_column(GAUGE_COLUMNS, path)?;

    let mut rows = Vec::new();
    let mut row_errors = sheet.row_errors.clone();
    for (line, record) in &sheet.records {
        match parse_vapor_row(record, t_col, p0_col, gauge_col) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line: *line, message }),
        }
    }

    finish(path, rows, row_errors, sheet.records.len())
}

fn parse_solution_row(record: &StringRecord, c_col: usize, cols: &[usize]) -> Result<SolutionRow, String> {
    let raw_c = get_cell(record, c_col).ok_or_else(|| "Missing concentration.".to_string())?;
    let concentration = parse_f64(raw_c).ok_or_else(|| format!("Invalid concentration '{raw_c}'."))?;
    if concentration < 0.0 {
        return Err(format!("Negative concentration {concentration}."));
    }

    let mut readings = Vec::with_capacity(cols.len());
    for &col in cols {
        if let Some(raw) = get_cell(record, col) {
            let v = parse_f64(raw).ok_or_else(|| format!("Invalid reading '{raw}'."))?;
            readings.push(v);
        }
    }
    if readings.is_empty() {
        return Err("No replicate readings.".to_string());
    }

    Ok(SolutionRow {
        concentration,
        readings,
    })
}

fn parse_vapor_row(record: &StringRecord, t_col: usize, p0_col: usize, gauge_col: usize) -> Result<VaporRow, String> {
    let field = |col: usize, name: &str| -> Result<f64, String> {
        let raw = get_cell(record, col).ok_or_else(|| format!("Missing `{name}` value."))?;
        parse_f64(raw).ok_or_else(|| format!("Invalid `{name}` value '{raw}'."))
    };
    let temperature_c = field(t_col, "T")?;
    let p0_kpa = field(p0_col, "p0")?;
    let gauge_kpa = field(gauge_col, "gauge")?;

    let p = p0_kpa - gauge_kpa;
    if p <= 0.0 {
        return Err(format!("Non-positive vapor pressure p0 - gauge = {p:.4} kPa."));
    }

    Ok(VaporRow {
        temperature_c,
        p0_kpa,
        gauge_kpa,
    })
}

fn finish<T>(path: &Path, rows: Vec<T>, row_errors: Vec<RowError>, rows_read: usize) -> Result<Ingested<T>, AppError> {
    for err in &row_errors {
        warn!("{}: skipping line {}: {}", path.display(), err.line, err.message);
    }
    if rows.is_empty() {
        return Err(AppError::data(format!(
            "No valid rows remain in '{}' after validation.",
            path.display()
        )));
    }
    Ok(Ingested {
        rows,
        row_errors,
        rows_read,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn header_normalization_strips_bom_and_case() {
        assert_eq!(normalize_header_name("\u{feff}T/℃ "), "t/℃");
        assert_eq!(normalize_header_name("ΔP1"), "Δp1");
    }

    #[test]
    fn greek_delta_replicate_headers_are_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "solution.csv", "c/(mol/L),Δp1,ΔP2,δp3
0.02,70.1,70.3,70.2
");

        let data = load_solution_table(&path).unwrap();
        assert_eq!(data.rows[0].readings, vec![70.1, 70.3, 70.2]);
    }

    #[test]
    fn solution_table_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "solution.csv",
            "c/(mol/L),dp1,dp2,dp3\n0.02,70.1,70.3,70.2\nabc,1,2,3\n0.05,66.0,,66.2\n,,,\n",
        );

        let data = load_solution_table(&path).unwrap();
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.rows_used(), 2);
        assert_eq!(data.rows[1].readings, vec![66.0, 66.2]);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn vapor_pressure_accepts_lab_sheet_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "vp.csv",
            "\u{feff}T/℃,p0/kPa,p表/kPa\n30,101.1,81.4\n35,101.1,102.0\n",
        );

        let data = load_vapor_pressure(&path).unwrap();
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.rows[0].temperature_c, 30.0);
        assert_eq!(data.row_errors.len(), 1);
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "emf.csv", "index,e_zn_hg,e_cu_zn\n1,1.0,1.1\n");

        let err = load_emf_readings(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn temperature_series_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let ok = write_csv(&dir, "ok.csv", "index,T/℃\n1,20.1\n2,20.2\n");
        assert_eq!(load_temperature_series(&ok).unwrap(), vec![20.1, 20.2]);

        let bad = write_csv(&dir, "bad.csv", "index,T/℃\n1,20.1\n2,x\n");
        assert_eq!(load_temperature_series(&bad).unwrap_err().exit_code(), 2);
    }
}
