//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from CLI flags or a batch manifest
//! - passed through the analysis code
//! - exported to CSV/JSON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Gas constant used throughout the lab handouts, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314;
/// Faraday constant, C/mol.
pub const FARADAY: f64 = 96485.0;
/// Avogadro constant, 1/mol.
pub const AVOGADRO: f64 = 6.022_140_76e23;
/// 0 °C in kelvin.
pub const ZERO_CELSIUS: f64 = 273.15;

pub const DEFAULT_SIGMA_WATER: f64 = 0.07118;
pub const DEFAULT_SURFACE_TEMPERATURE_C: f64 = 30.0;
pub const DEFAULT_SIGMA_DEGREE: usize = 2;
pub const DEFAULT_GAMMA_DEGREE: usize = 3;

pub const DEFAULT_SEGMENT_LEN: usize = 7;
pub const DEFAULT_BEFORE_DEGREE: usize = 3;
pub const DEFAULT_DURING_DEGREE: usize = 7;
pub const DEFAULT_AFTER_DEGREE: usize = 3;

pub const DEFAULT_EMF_TEMPERATURE_C: f64 = 16.6;
pub const DEFAULT_ELECTROLYTE_CONCENTRATION: f64 = 0.1;
pub const DEFAULT_ACTIVITY_COEFFICIENT: f64 = 0.150;

pub const DEFAULT_REFERENCE_BOILING_C: f64 = 76.8;
pub const DEFAULT_LOCAL_PRESSURE_KPA: f64 = 101.10;
pub const DEFAULT_STANDARD_PRESSURE_KPA: f64 = 101.325;
pub const DEFAULT_REFERENCE_ENTHALPY_KJ: f64 = 30.81;

/// The four supported lab exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentKind {
    /// Surface tension and adsorption of n-butanol (maximum bubble pressure).
    SurfaceTension,
    /// Heat of combustion (oxygen bomb, Reynolds temperature correction).
    Combustion,
    /// Electrode preparation and galvanic cell EMF.
    Emf,
    /// Saturated vapor pressure (static method).
    VaporPressure,
}

impl ExperimentKind {
    /// File-name stem used for outputs.
    pub fn slug(self) -> &'static str {
        match self {
            ExperimentKind::SurfaceTension => "surface-tension",
            ExperimentKind::Combustion => "combustion",
            ExperimentKind::Emf => "emf",
            ExperimentKind::VaporPressure => "vapor-pressure",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ExperimentKind::SurfaceTension => "Surface tension & adsorption of n-butanol",
            ExperimentKind::Combustion => "Heat of combustion",
            ExperimentKind::Emf => "Electrode potentials & galvanic cell EMF",
            ExperimentKind::VaporPressure => "Saturated vapor pressure (static method)",
        }
    }
}

/// Constants for the surface tension experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceTensionParams {
    /// Surface tension of pure water at the bath temperature, N/m.
    pub sigma_water: f64,
    /// Bath temperature, °C.
    pub temperature_c: f64,
    /// Polynomial degree for σ(c).
    pub sigma_degree: usize,
    /// Polynomial degree for Γ(c).
    pub gamma_degree: usize,
}

impl Default for SurfaceTensionParams {
    fn default() -> Self {
        Self {
            sigma_water: DEFAULT_SIGMA_WATER,
            temperature_c: DEFAULT_SURFACE_TEMPERATURE_C,
            sigma_degree: DEFAULT_SIGMA_DEGREE,
            gamma_degree: DEFAULT_GAMMA_DEGREE,
        }
    }
}

/// Constants for the combustion experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombustionParams {
    /// Readings in the pre-period and in the post-period.
    pub segment_len: usize,
    pub before_degree: usize,
    pub during_degree: usize,
    pub after_degree: usize,
}

impl Default for CombustionParams {
    fn default() -> Self {
        Self {
            segment_len: DEFAULT_SEGMENT_LEN,
            before_degree: DEFAULT_BEFORE_DEGREE,
            during_degree: DEFAULT_DURING_DEGREE,
            after_degree: DEFAULT_AFTER_DEGREE,
        }
    }
}

/// Constants for the galvanic cell experiment.
///
/// Temperature coefficients follow `φ°(T) = φ°(298) + α(T - 298) + ½β(T - 298)²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmfParams {
    /// Room temperature during the measurement, °C.
    pub temperature_c: f64,
    /// CuSO4 concentration, mol/L.
    pub c_cu: f64,
    /// Mean activity coefficient of CuSO4.
    pub gamma_cu: f64,
    /// ZnSO4 concentration, mol/L.
    pub c_zn: f64,
    /// Mean activity coefficient of ZnSO4.
    pub gamma_zn: f64,
    pub alpha_cu: f64,
    pub beta_cu: f64,
    pub alpha_zn: f64,
    pub beta_zn: f64,
}

impl Default for EmfParams {
    fn default() -> Self {
        Self {
            temperature_c: DEFAULT_EMF_TEMPERATURE_C,
            c_cu: DEFAULT_ELECTROLYTE_CONCENTRATION,
            gamma_cu: DEFAULT_ACTIVITY_COEFFICIENT,
            c_zn: DEFAULT_ELECTROLYTE_CONCENTRATION,
            gamma_zn: DEFAULT_ACTIVITY_COEFFICIENT,
            alpha_cu: -0.000016,
            beta_cu: 0.0,
            alpha_zn: 0.000100,
            beta_zn: 0.62e-6,
        }
    }
}

/// Constants for the vapor pressure experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaporPressureParams {
    /// Literature normal boiling point of the liquid, °C.
    pub reference_boiling_c: f64,
    /// Barometric pressure in the lab, kPa.
    pub local_pressure_kpa: f64,
    pub standard_pressure_kpa: f64,
    /// Literature molar enthalpy of vaporization, kJ/mol.
    pub reference_enthalpy_kj: f64,
    /// Factor converting lg to ln in the Clausius–Clapeyron slope.
    pub ln10_factor: f64,
}

impl Default for VaporPressureParams {
    fn default() -> Self {
        Self {
            reference_boiling_c: DEFAULT_REFERENCE_BOILING_C,
            local_pressure_kpa: DEFAULT_LOCAL_PRESSURE_KPA,
            standard_pressure_kpa: DEFAULT_STANDARD_PRESSURE_KPA,
            reference_enthalpy_kj: DEFAULT_REFERENCE_ENTHALPY_KJ,
            ln10_factor: 2.303,
        }
    }
}

/// A named temperature trace for the combustion experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInput {
    pub name: String,
    pub path: PathBuf,
}

/// One experiment to run, with its input files and constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExperimentJob {
    SurfaceTension {
        water: PathBuf,
        solution: PathBuf,
        #[serde(default)]
        params: SurfaceTensionParams,
    },
    Combustion {
        series: Vec<SeriesInput>,
        #[serde(default)]
        params: CombustionParams,
    },
    Emf {
        input: PathBuf,
        #[serde(default)]
        params: EmfParams,
    },
    VaporPressure {
        input: PathBuf,
        #[serde(default)]
        params: VaporPressureParams,
    },
}

impl ExperimentJob {
    pub fn kind(&self) -> ExperimentKind {
        match self {
            ExperimentJob::SurfaceTension { .. } => ExperimentKind::SurfaceTension,
            ExperimentJob::Combustion { .. } => ExperimentKind::Combustion,
            ExperimentJob::Emf { .. } => ExperimentKind::Emf,
            ExperimentJob::VaporPressure { .. } => ExperimentKind::VaporPressure,
        }
    }

    /// All input files, in a stable order.
    pub fn inputs(&self) -> Vec<PathBuf> {
        match self {
            ExperimentJob::SurfaceTension { water, solution, .. } => vec![water.clone(), solution.clone()],
            ExperimentJob::Combustion { series, .. } => series.iter().map(|s| s.path.clone()).collect(),
            ExperimentJob::Emf { input, .. } | ExperimentJob::VaporPressure { input, .. } => vec![input.clone()],
        }
    }

    /// Resolve relative input paths against `base` (the manifest directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        match self {
            ExperimentJob::SurfaceTension { water, solution, .. } => {
                fix(water);
                fix(solution);
            }
            ExperimentJob::Combustion { series, .. } => series.iter_mut().for_each(|s| fix(&mut s.path)),
            ExperimentJob::Emf { input, .. } | ExperimentJob::VaporPressure { input, .. } => fix(input),
        }
    }
}

/// A batch manifest: several experiments sharing one output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Output directory (relative to the manifest) unless overridden with `--out`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
    pub experiments: Vec<ExperimentJob>,
}

/// Where and how results are written.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    /// Zip the plot directory at the end of the run.
    pub archive: bool,
    /// Print an ASCII preview of each chart.
    pub preview: bool,
    pub preview_width: usize,
    pub preview_height: usize,
}

impl OutputConfig {
    pub fn plots_dir(&self) -> PathBuf {
        self.out_dir.join("plots")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.out_dir.join("plots.zip")
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One row of the n-butanol solution table.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionRow {
    /// Concentration, mol/L.
    pub concentration: f64,
    /// Replicate manometer readings.
    pub readings: Vec<f64>,
}

/// One set of cell voltage readings, V.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmfReading {
    /// Zn | ZnSO4 || KCl(sat) | Hg2Cl2 | Hg
    pub e_zn_hg: f64,
    /// Zn | ZnSO4 || CuSO4 | Cu
    pub e_cu_zn: f64,
    /// Hg | Hg2Cl2 | KCl(sat) || CuSO4 | Cu
    pub e_cu_hg: f64,
}

/// One row of the vapor pressure table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VaporRow {
    pub temperature_c: f64,
    /// Barometric pressure, kPa.
    pub p0_kpa: f64,
    /// Vacuum gauge reading, kPa.
    pub gauge_kpa: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// Absent when the observations are constant.
    pub r_squared: Option<f64>,
    pub n: usize,
}

impl FitQuality {
    pub fn from_predictions(observed: &[f64], predicted: impl IntoIterator<Item = f64>) -> Self {
        let n = observed.len();
        let sse: f64 = observed
            .iter()
            .zip(predicted)
            .map(|(&y, y_fit)| (y - y_fit).powi(2))
            .sum();
        let rmse = if n > 0 { (sse / n as f64).sqrt() } else { 0.0 };

        let r_squared = if n > 0 {
            let mean = observed.iter().sum::<f64>() / n as f64;
            let sst: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
            (sst > 0.0).then(|| 1.0 - sse / sst)
        } else {
            None
        };

        Self { sse, rmse, r_squared, n }
    }
}

/// A printable/exportable table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Fixed-point with the given number of decimals.
    Fixed(f64, usize),
    /// Scientific notation with the given number of decimals.
    Sci(f64, usize),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Formatted for terminal and chart output.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Fixed(v, d) => format!("{v:.prec$}", prec = *d),
            Cell::Sci(v, d) => format!("{v:.prec$e}", prec = *d),
        }
    }

    /// Full precision for CSV export.
    pub fn raw(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Fixed(v, _) | Cell::Sci(v, _) => v.to_string(),
        }
    }
}

/// A titled table of results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Lower-case, filesystem-friendly form of a display name.
pub fn slugify(name: &str) -> String {
    let mut out = String::new();
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_matches('-').to_string();
    if out.is_empty() { "series".to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Benzoic acid"), "benzoic-acid");
        assert_eq!(slugify("  萘 (run 2) "), "萘-run-2");
        assert_eq!(slugify("***"), "series");
    }

    #[test]
    fn fit_quality_perfect_fit() {
        let q = FitQuality::from_predictions(&[1.0, 2.0, 3.0], [1.0, 2.0, 3.0]);
        assert_eq!(q.sse, 0.0);
        assert_eq!(q.r_squared, Some(1.0));

        let flat = FitQuality::from_predictions(&[2.0, 2.0], [2.0, 2.0]);
        assert_eq!(flat.r_squared, None);
    }

    #[test]
    fn manifest_fills_default_params() {
        let json = r#"{
            "experiments": [
                {"kind": "emf", "input": "emf.csv", "params": {"temperature_c": 20.0}},
                {"kind": "vapor-pressure", "input": "vp.csv"}
            ]
        }"#;
        let mut manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.out, None);

        match &manifest.experiments[0] {
            ExperimentJob::Emf { params, .. } => {
                assert_eq!(params.temperature_c, 20.0);
                assert_eq!(params.c_cu, DEFAULT_ELECTROLYTE_CONCENTRATION);
            }
            other => panic!("unexpected job {other:?}"),
        }

        manifest.experiments[1].resolve_paths(Path::new("/data"));
        assert_eq!(manifest.experiments[1].inputs(), vec![PathBuf::from("/data/vp.csv")]);
        assert_eq!(manifest.experiments[1].kind(), ExperimentKind::VaporPressure);
    }
}
