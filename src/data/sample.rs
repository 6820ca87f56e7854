//! Synthetic lab datasets.
//!
//! Each generator draws readings from the physical model of its experiment plus
//! Gaussian instrument noise, so `labfit batch` has something realistic to chew on
//! without a lab notebook at hand. Output is deterministic for a given seed.

use std::fs::File;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    CombustionParams, EmfParams, ExperimentJob, GAS_CONSTANT, Manifest, SeriesInput, SurfaceTensionParams,
    VaporPressureParams, ZERO_CELSIUS, slugify,
};
use crate::error::AppError;

/// Manometer reading of pure water the instrument constant is calibrated on.
const WATER_DP: f64 = 72.0;
const REPLICATES: usize = 3;
/// Szyszkowski constants for n-butanol at 30 °C.
const GAMMA_MAX: f64 = 6.0e-6;
const LANGMUIR_K: f64 = 15.0;

/// Combustion traces: readings per trace and where the temperature jump sits.
const TRACE_LEN: usize = 24;
const JUMP_CENTER: f64 = 12.0;
const JUMP_WIDTH: f64 = 1.0;
const TRACE_DRIFT: f64 = 0.003;

const ENTHALPY_J: f64 = 30_810.0;
const BOILING_K: f64 = 349.95;

/// What `write_sample_data` produced.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub files: Vec<PathBuf>,
    pub manifest: PathBuf,
}

/// Write CSV inputs for all four experiments plus a `manifest.json` running them.
pub fn write_sample_data(dir: &Path, seed: u64) -> Result<SampleSet, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", dir.display())))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut files = Vec::new();

    let water = dir.join("surface-tension-water.csv");
    let solution = dir.join("surface-tension-solution.csv");
    let (water_rows, solution_rows) = surface_tension_rows(&mut rng)?;
    write_csv(&water, &replicate_headers(None), &water_rows)?;
    write_csv(&solution, &replicate_headers(Some("c/(mol/L)")), &solution_rows)?;
    files.extend([water, solution]);

    let mut series = Vec::new();
    for (name, base, jump) in [("Benzoic acid", 20.15, 1.6), ("Naphthalene", 20.40, 1.9)] {
        let path = dir.join(format!("combustion-{}.csv", slugify(name)));
        write_csv(&path, &["x", "T/℃"], &combustion_rows(&mut rng, base, jump)?)?;
        series.push(SeriesInput {
            name: name.to_string(),
            path: relative_name(&path),
        });
        files.push(path);
    }

    let emf = dir.join("emf.csv");
    write_csv(&emf, &["e_zn_hg", "e_cu_zn", "e_cu_hg"], &emf_rows(&mut rng)?)?;
    files.push(emf.clone());

    let vapor = dir.join("vapor-pressure.csv");
    write_csv(&vapor, &["T/℃", "p0/kPa", "p表/kPa"], &vapor_rows(&mut rng)?)?;
    files.push(vapor.clone());

    let manifest = Manifest {
        out: Some(PathBuf::from("results")),
        experiments: vec![
            ExperimentJob::SurfaceTension {
                water: relative_name(&files[0]),
                solution: relative_name(&files[1]),
                params: SurfaceTensionParams::default(),
            },
            ExperimentJob::Combustion {
                series,
                params: CombustionParams::default(),
            },
            ExperimentJob::Emf {
                input: relative_name(&emf),
                params: EmfParams::default(),
            },
            ExperimentJob::VaporPressure {
                input: relative_name(&vapor),
                params: VaporPressureParams::default(),
            },
        ],
    };
    let manifest_path = dir.join("manifest.json");
    let out = File::create(&manifest_path)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", manifest_path.display())))?;
    serde_json::to_writer_pretty(out, &manifest)
        .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", manifest_path.display())))?;
    log::info!("Wrote {}", manifest_path.display());

    Ok(SampleSet {
        files,
        manifest: manifest_path,
    })
}

fn noise(sd: f64) -> Result<Normal<f64>, AppError> {
    Normal::new(0.0, sd).map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))
}

fn relative_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_else(|| path.to_path_buf())
}

fn replicate_headers(first: Option<&'static str>) -> Vec<String> {
    first
        .into_iter()
        .map(str::to_string)
        .chain((1..=REPLICATES).map(|i| format!("dp{i}")))
        .collect()
}

/// Water calibration rows and solution rows following σ = σw − RTΓ∞·ln(1 + Kc).
fn surface_tension_rows(rng: &mut StdRng) -> Result<(Vec<Vec<String>>, Vec<Vec<String>>), AppError> {
    let params = SurfaceTensionParams::default();
    let dist = noise(0.3)?;
    let instrument = params.sigma_water / WATER_DP;
    let rt = GAS_CONSTANT * (params.temperature_c + ZERO_CELSIUS);

    let water = vec![
        (0..REPLICATES)
            .map(|_| format!("{:.1}", WATER_DP + dist.sample(rng)))
            .collect(),
    ];

    let mut solution = Vec::new();
    for i in 1..=12 {
        let c = 0.02 * i as f64;
        let sigma = params.sigma_water - rt * GAMMA_MAX * (1.0 + LANGMUIR_K * c).ln();
        let mut row = vec![format!("{c:.2}")];
        row.extend((0..REPLICATES).map(|_| format!("{:.1}", sigma / instrument + dist.sample(rng))));
        solution.push(row);
    }
    Ok((water, solution))
}

/// A calorimeter trace: slow drift plus a logistic jump of `jump` degrees.
fn combustion_rows(rng: &mut StdRng, base: f64, jump: f64) -> Result<Vec<Vec<String>>, AppError> {
    let dist = noise(0.002)?;
    Ok((1..=TRACE_LEN)
        .map(|x| {
            let x = x as f64;
            let rise = jump / (1.0 + (-(x - JUMP_CENTER) / JUMP_WIDTH).exp());
            let t = base + TRACE_DRIFT * x + rise + dist.sample(rng);
            vec![format!("{x}"), format!("{t:.3}")]
        })
        .collect())
}

fn emf_rows(rng: &mut StdRng) -> Result<Vec<Vec<String>>, AppError> {
    let dist = noise(0.0004)?;
    Ok((0..3)
        .map(|_| {
            [1.0571, 1.0963, 0.0412]
                .iter()
                .map(|e| format!("{:.4}", e + dist.sample(rng)))
                .collect()
        })
        .collect())
}

/// Clausius–Clapeyron vapor pressures, reported as barometer minus gauge.
fn vapor_rows(rng: &mut StdRng) -> Result<Vec<Vec<String>>, AppError> {
    let params = VaporPressureParams::default();
    let dist = noise(0.05)?;
    Ok((0..10)
        .map(|i| {
            let t_c = 30.0 + 5.0 * i as f64;
            let t_k = t_c + ZERO_CELSIUS;
            let p = params.standard_pressure_kpa * (-ENTHALPY_J / GAS_CONSTANT * (1.0 / t_k - 1.0 / BOILING_K)).exp();
            let gauge = params.local_pressure_kpa - p + dist.sample(rng);
            vec![
                format!("{t_c:.1}"),
                format!("{:.2}", params.local_pressure_kpa),
                format!("{gauge:.2}"),
            ]
        })
        .collect())
}

fn write_csv<H: AsRef<str>>(path: &Path, headers: &[H], rows: &[Vec<String>]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create '{}': {e}", path.display())))?;
    writer
        .write_record(headers.iter().map(|h| h.as_ref()))
        .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", path.display())))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", path.display())))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{load_manifest, load_solution_table, load_temperature_series, load_vapor_pressure};

    #[test]
    fn same_seed_gives_identical_files() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let set_a = write_sample_data(a.path(), 7).unwrap();
        let set_b = write_sample_data(b.path(), 7).unwrap();

        assert_eq!(set_a.files.len(), 6);
        for (fa, fb) in set_a.files.iter().zip(&set_b.files) {
            assert_eq!(std::fs::read(fa).unwrap(), std::fs::read(fb).unwrap());
        }
    }

    #[test]
    fn samples_load_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let set = write_sample_data(dir.path(), 42).unwrap();

        let solution = load_solution_table(&dir.path().join("surface-tension-solution.csv")).unwrap();
        assert_eq!(solution.rows.len(), 12);
        assert!(solution.row_errors.is_empty());
        assert_eq!(solution.rows[0].readings.len(), REPLICATES);

        let trace = load_temperature_series(&dir.path().join("combustion-benzoic-acid.csv")).unwrap();
        assert_eq!(trace.len(), TRACE_LEN);

        let vapor = load_vapor_pressure(&dir.path().join("vapor-pressure.csv")).unwrap();
        assert_eq!(vapor.rows.len(), 10);

        let manifest = load_manifest(&set.manifest).unwrap();
        assert_eq!(manifest.experiments.len(), 4);
        assert_eq!(manifest.out, Some(dir.path().join("results")));
    }

    #[test]
    fn vapor_sample_recovers_enthalpy() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_data(dir.path(), 42).unwrap();

        let vapor = load_vapor_pressure(&dir.path().join("vapor-pressure.csv")).unwrap();
        let analysis = crate::analysis::vapor_pressure::analyze(&vapor.rows, &VaporPressureParams::default()).unwrap();
        assert!((analysis.enthalpy - ENTHALPY_J).abs() / ENTHALPY_J < 0.03);
    }
}
