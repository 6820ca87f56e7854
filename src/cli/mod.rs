//! Command-line parsing for the lab data processor.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! analysis code. Defaults mirror the constants in `domain`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_ACTIVITY_COEFFICIENT, DEFAULT_AFTER_DEGREE, DEFAULT_BEFORE_DEGREE, DEFAULT_DURING_DEGREE,
    DEFAULT_ELECTROLYTE_CONCENTRATION, DEFAULT_EMF_TEMPERATURE_C, DEFAULT_GAMMA_DEGREE, DEFAULT_LOCAL_PRESSURE_KPA,
    DEFAULT_REFERENCE_BOILING_C, DEFAULT_REFERENCE_ENTHALPY_KJ, DEFAULT_SEGMENT_LEN, DEFAULT_SIGMA_DEGREE,
    DEFAULT_SIGMA_WATER, DEFAULT_STANDARD_PRESSURE_KPA, DEFAULT_SURFACE_TEMPERATURE_C, SeriesInput,
};

/// Default output directory when neither `--out` nor a manifest names one.
pub const DEFAULT_OUT_DIR: &str = "results";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "labfit", version, about = "Physical chemistry lab data processing: fits, plots, archive")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Surface tension of n-butanol solutions and Gibbs adsorption.
    SurfaceTension(SurfaceTensionArgs),
    /// Heat of combustion: Reynolds-corrected temperature rise per trace.
    Combustion(CombustionArgs),
    /// Electrode potentials and galvanic cell EMF.
    Emf(EmfArgs),
    /// Saturated vapor pressure and enthalpy of vaporization.
    VaporPressure(VaporPressureArgs),
    /// Run every experiment listed in a JSON manifest (in parallel).
    Batch(BatchArgs),
    /// Write synthetic input data and a manifest for all experiments.
    Sample(SampleArgs),
}

/// Options shared by every command that writes results.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Output directory (default: `results`, or the manifest's `out`).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Skip zipping the plot directory.
    #[arg(long)]
    pub no_archive: bool,

    /// Print an ASCII preview of each chart.
    #[arg(long)]
    pub preview: bool,

    /// Preview width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SurfaceTensionArgs {
    /// CSV of pure-water manometer readings (`dp1`, `dp2`, ...).
    #[arg(long, value_name = "CSV")]
    pub water: PathBuf,

    /// CSV of solution readings (`c/(mol/L)`, `dp1`, `dp2`, ...).
    #[arg(long, value_name = "CSV")]
    pub solution: PathBuf,

    /// Surface tension of water at the bath temperature, N/m.
    #[arg(long, default_value_t = DEFAULT_SIGMA_WATER)]
    pub sigma_water: f64,

    /// Bath temperature, °C.
    #[arg(long, default_value_t = DEFAULT_SURFACE_TEMPERATURE_C)]
    pub temperature: f64,

    /// Polynomial degree for σ(c).
    #[arg(long, default_value_t = DEFAULT_SIGMA_DEGREE)]
    pub sigma_degree: usize,

    /// Polynomial degree for Γ(c).
    #[arg(long, default_value_t = DEFAULT_GAMMA_DEGREE)]
    pub gamma_degree: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CombustionArgs {
    /// Temperature trace as `NAME=CSV` (repeatable). Without `NAME=` the file stem is used.
    #[arg(long = "series", value_name = "NAME=CSV", required = true, value_parser = parse_series)]
    pub series: Vec<SeriesInput>,

    /// Readings in the pre-period (and in the post-period).
    #[arg(long, default_value_t = DEFAULT_SEGMENT_LEN)]
    pub segment_len: usize,

    #[arg(long, default_value_t = DEFAULT_BEFORE_DEGREE)]
    pub before_degree: usize,

    #[arg(long, default_value_t = DEFAULT_DURING_DEGREE)]
    pub during_degree: usize,

    #[arg(long, default_value_t = DEFAULT_AFTER_DEGREE)]
    pub after_degree: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EmfArgs {
    /// CSV of voltage readings (`e_zn_hg`, `e_cu_zn`, `e_cu_hg`).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Room temperature, °C.
    #[arg(long, default_value_t = DEFAULT_EMF_TEMPERATURE_C)]
    pub temperature: f64,

    #[arg(long, default_value_t = DEFAULT_ELECTROLYTE_CONCENTRATION)]
    pub c_cu: f64,

    #[arg(long, default_value_t = DEFAULT_ACTIVITY_COEFFICIENT)]
    pub gamma_cu: f64,

    #[arg(long, default_value_t = DEFAULT_ELECTROLYTE_CONCENTRATION)]
    pub c_zn: f64,

    #[arg(long, default_value_t = DEFAULT_ACTIVITY_COEFFICIENT)]
    pub gamma_zn: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct VaporPressureArgs {
    /// CSV of `T/℃`, `p0/kPa`, `p表/kPa`.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Literature normal boiling point, °C.
    #[arg(long, default_value_t = DEFAULT_REFERENCE_BOILING_C)]
    pub reference_boiling: f64,

    /// Barometric pressure in the lab, kPa.
    #[arg(long, default_value_t = DEFAULT_LOCAL_PRESSURE_KPA)]
    pub local_pressure: f64,

    #[arg(long, default_value_t = DEFAULT_STANDARD_PRESSURE_KPA)]
    pub standard_pressure: f64,

    /// Literature enthalpy of vaporization, kJ/mol.
    #[arg(long, default_value_t = DEFAULT_REFERENCE_ENTHALPY_KJ)]
    pub reference_enthalpy: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Manifest JSON (see `labfit sample`).
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Directory to write the sample CSVs and manifest into.
    #[arg(long, default_value = "lab-data")]
    pub out: PathBuf,

    /// Random seed for the instrument noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Parse `NAME=PATH` (or a bare path, named after its file stem).
pub fn parse_series(raw: &str) -> Result<SeriesInput, String> {
    let (name, path) = match raw.split_once('=') {
        Some((name, path)) => (name.trim().to_string(), PathBuf::from(path.trim())),
        None => {
            let path = PathBuf::from(raw.trim());
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            (stem, path)
        }
    };
    if name.is_empty() || path.as_os_str().is_empty() {
        return Err(format!("expected NAME=CSV, got '{raw}'"));
    }
    Ok(SeriesInput { name, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_accepts_named_and_bare_paths() {
        let named = parse_series("Benzoic acid=data/benzoic.csv").unwrap();
        assert_eq!(named.name, "Benzoic acid");
        assert_eq!(named.path, PathBuf::from("data/benzoic.csv"));

        let bare = parse_series("data/naphthalene.csv").unwrap();
        assert_eq!(bare.name, "naphthalene");

        assert!(parse_series("=x.csv").is_err());
    }

    #[test]
    fn combustion_flags_parse() {
        let cli = Cli::try_parse_from([
            "labfit",
            "combustion",
            "--series",
            "a=a.csv",
            "--series",
            "b=b.csv",
            "--segment-len",
            "5",
            "--no-archive",
        ])
        .unwrap();
        let Command::Combustion(args) = cli.command else {
            panic!("expected combustion");
        };
        assert_eq!(args.series.len(), 2);
        assert_eq!(args.segment_len, 5);
        assert_eq!(args.during_degree, DEFAULT_DURING_DEGREE);
        assert!(args.output.no_archive);
        assert_eq!(args.output.out, None);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
