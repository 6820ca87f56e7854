//! Shared experiment pipeline used by the single-experiment commands and `batch`.
//!
//! One job runs: ingest -> analyze -> report tables -> SVG/CSV/JSON outputs.
//! Jobs are independent, so a batch runs them on the rayon pool and archives the
//! plot directory once they have all finished.

use std::path::{Path, PathBuf};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::analysis::{combustion, emf, surface_tension, vapor_pressure};
use crate::domain::{
    CombustionParams, EmfParams, ExperimentJob, ExperimentKind, OutputConfig, ResultTable, RowError, SeriesInput,
    SurfaceTensionParams, VaporPressureParams, slugify,
};
use crate::error::AppError;
use crate::io::{self, ResultsFile};
use crate::plot::{self, PlotSeries};
use crate::report;

/// Everything one experiment produced.
#[derive(Debug, Clone)]
pub struct ExperimentOutput {
    pub kind: ExperimentKind,
    /// Terminal report (banner, skipped rows, tables).
    pub report: String,
    /// ASCII chart previews, rendered only when requested.
    pub previews: Vec<String>,
    /// Files written, in order.
    pub artifacts: Vec<PathBuf>,
}

/// Result of a batch: successful outputs in job order, failures, archive entries.
#[derive(Debug)]
pub struct BatchOutcome {
    pub outputs: Vec<ExperimentOutput>,
    pub failures: Vec<(ExperimentKind, AppError)>,
    /// Entry names of `plots.zip`, when archiving was enabled.
    pub archive: Option<Vec<String>>,
}

impl BatchOutcome {
    /// The first failure in job order, if any.
    pub fn first_error(&self) -> Option<&AppError> {
        self.failures.first().map(|(_, e)| e)
    }
}

/// Create `<out>` and `<out>/plots`.
pub fn prepare_output(config: &OutputConfig) -> Result<(), AppError> {
    let plots = config.plots_dir();
    std::fs::create_dir_all(&plots)
        .map_err(|e| AppError::output(format!("Failed to create output directory '{}': {e}", plots.display())))
}

/// Run all jobs in parallel, then archive the plot directory.
pub fn run_batch(jobs: &[ExperimentJob], config: &OutputConfig) -> Result<BatchOutcome, AppError> {
    io::check_output_stems(jobs)?;
    prepare_output(config)?;

    let results: Vec<Result<ExperimentOutput, AppError>> = jobs.par_iter().map(|job| run_job(job, config)).collect();

    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => {
                error!("{} failed: {err}", job.kind().display_name());
                failures.push((job.kind(), err));
            }
        }
    }

    let archive = if config.archive {
        Some(io::zip_directory(&config.plots_dir(), &config.archive_path())?)
    } else {
        None
    };

    Ok(BatchOutcome {
        outputs,
        failures,
        archive,
    })
}

/// Run one experiment and write its outputs under `config.out_dir`.
pub fn run_job(job: &ExperimentJob, config: &OutputConfig) -> Result<ExperimentOutput, AppError> {
    info!("Running {}", job.kind().display_name());
    let inputs = job.inputs();
    match job {
        ExperimentJob::SurfaceTension {
            water,
            solution,
            params,
        } => run_surface_tension(water, solution, params, &inputs, config),
        ExperimentJob::Combustion { series, params } => run_combustion(series, params, &inputs, config),
        ExperimentJob::Emf { input, params } => run_emf(input, params, &inputs, config),
        ExperimentJob::VaporPressure { input, params } => run_vapor_pressure(input, params, &inputs, config),
    }
}

fn run_surface_tension(
    water: &Path,
    solution: &Path,
    params: &SurfaceTensionParams,
    inputs: &[PathBuf],
    config: &OutputConfig,
) -> Result<ExperimentOutput, AppError> {
    let kind = ExperimentKind::SurfaceTension;
    let water_in = io::load_water_readings(water)?;
    log_ingest(water, &water_in);
    let solution_in = io::load_solution_table(solution)?;
    log_ingest(solution, &solution_in);
    let analysis = surface_tension::analyze(&water_in.rows, &solution_in.rows, params)?;

    // Two input files share one list, so keep the file name with each error.
    let mut row_errors = tag_errors(water, water_in.row_errors);
    row_errors.extend(tag_errors(solution, solution_in.row_errors));

    let table = report::surface_tension_table(&analysis);
    let summary = report::surface_tension_summary(&analysis);
    let mut out = Writer::new(kind, config);
    out.chart(kind.slug(), |path| plot::write_surface_tension_chart(path, &analysis))?;
    out.table(kind.slug(), &table)?;
    out.json(kind.slug(), inputs, &row_errors, &analysis)?;
    out.preview(&plot::surface_tension_series(&analysis));

    Ok(out.finish(report::format_report(kind, None, &row_errors, &[table, summary])))
}

fn run_combustion(
    series: &[SeriesInput],
    params: &CombustionParams,
    inputs: &[PathBuf],
    config: &OutputConfig,
) -> Result<ExperimentOutput, AppError> {
    let kind = ExperimentKind::Combustion;
    if series.is_empty() {
        return Err(AppError::input("Combustion needs at least one temperature series."));
    }

    let mut out = Writer::new(kind, config);
    let mut reports = Vec::with_capacity(series.len());
    let mut analyses = Vec::with_capacity(series.len());
    for s in series {
        let readings = io::load_temperature_series(&s.path)?;
        let analysis = combustion::analyze(&s.name, &readings, params)?;
        debug!(
            "{}: x_mid = {:.4} ({:?}), ΔT = {:.4}",
            s.name, analysis.x_mid, analysis.crossing, analysis.delta_t
        );

        let stem = format!("{}-{}", kind.slug(), slugify(&s.name));
        let table = report::combustion_table(&analysis);
        out.chart(&stem, |path| plot::write_combustion_chart(path, &analysis))?;
        out.table(&stem, &table)?;
        out.preview(&[plot::combustion_series(&analysis)]);

        reports.push(report::format_report(
            kind,
            Some(s.name.as_str()),
            &[],
            &[table, report::combustion_summary(&analysis)],
        ));
        analyses.push(analysis);
    }
    out.json(kind.slug(), inputs, &[], &analyses)?;

    Ok(out.finish(reports.join("\n")))
}

fn run_emf(
    input: &Path,
    params: &EmfParams,
    inputs: &[PathBuf],
    config: &OutputConfig,
) -> Result<ExperimentOutput, AppError> {
    let kind = ExperimentKind::Emf;
    let ingested = io::load_emf_readings(input)?;
    log_ingest(input, &ingested);
    let analysis = emf::analyze(&ingested.rows, params)?;

    let readings = report::emf_readings_table(&analysis);
    let parameters = report::emf_parameters_table(&analysis);
    let tables = [readings, parameters];

    let mut out = Writer::new(kind, config);
    out.chart(kind.slug(), |path| plot::write_tables_svg(path, &tables))?;
    out.table(kind.slug(), &tables[1])?;
    out.table(&format!("{}-readings", kind.slug()), &tables[0])?;
    out.json(kind.slug(), inputs, &ingested.row_errors, &analysis)?;

    Ok(out.finish(report::format_report(kind, None, &ingested.row_errors, &tables)))
}

fn run_vapor_pressure(
    input: &Path,
    params: &VaporPressureParams,
    inputs: &[PathBuf],
    config: &OutputConfig,
) -> Result<ExperimentOutput, AppError> {
    let kind = ExperimentKind::VaporPressure;
    let ingested = io::load_vapor_pressure(input)?;
    log_ingest(input, &ingested);
    let analysis = vapor_pressure::analyze(&ingested.rows, params)?;
    debug!(
        "lg p = {:.4}/T + {:.4} (r = {:.6})",
        analysis.regression.slope, analysis.regression.intercept, analysis.regression.r_value
    );

    let table = report::vapor_pressure_table(&analysis);
    let summary = report::vapor_pressure_summary(&analysis);
    let mut out = Writer::new(kind, config);
    out.chart(kind.slug(), |path| plot::write_vapor_pressure_chart(path, &analysis))?;
    out.table(kind.slug(), &table)?;
    out.json(kind.slug(), inputs, &ingested.row_errors, &analysis)?;
    out.preview(&[plot::vapor_pressure_series(&analysis)]);

    Ok(out.finish(report::format_report(kind, None, &ingested.row_errors, &[table, summary])))
}

fn log_ingest<T>(path: &Path, ingested: &io::Ingested<T>) {
    info!(
        "{}: {} of {} row(s) usable",
        path.display(),
        ingested.rows_used(),
        ingested.rows_read
    );
}

fn tag_errors(path: &Path, errors: Vec<RowError>) -> Vec<RowError> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    errors
        .into_iter()
        .map(|e| RowError {
            line: e.line,
            message: format!("{name}: {}", e.message),
        })
        .collect()
}

/// Collects the artefacts of one job under the configured layout.
struct Writer<'a> {
    kind: ExperimentKind,
    config: &'a OutputConfig,
    previews: Vec<String>,
    artifacts: Vec<PathBuf>,
}

impl<'a> Writer<'a> {
    fn new(kind: ExperimentKind, config: &'a OutputConfig) -> Self {
        Self {
            kind,
            config,
            previews: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    fn chart(&mut self, stem: &str, draw: impl FnOnce(&Path) -> Result<(), AppError>) -> Result<(), AppError> {
        let path = self.config.plots_dir().join(format!("{stem}.svg"));
        draw(&path)?;
        self.artifacts.push(path);
        Ok(())
    }

    fn table(&mut self, stem: &str, table: &ResultTable) -> Result<(), AppError> {
        let path = self.config.out_dir.join(format!("{stem}.csv"));
        io::write_table_csv(&path, table)?;
        self.artifacts.push(path);
        Ok(())
    }

    fn json<T: serde::Serialize>(
        &mut self,
        stem: &str,
        inputs: &[PathBuf],
        row_errors: &[RowError],
        results: &T,
    ) -> Result<(), AppError> {
        let path = self.config.out_dir.join(format!("{stem}.json"));
        io::write_results_json(&path, &ResultsFile::new(self.kind, inputs, row_errors, results))?;
        self.artifacts.push(path);
        Ok(())
    }

    fn preview(&mut self, series: &[PlotSeries]) {
        if !self.config.preview {
            return;
        }
        for s in series {
            self.previews
                .push(plot::render_ascii_plot(s, self.config.preview_width, self.config.preview_height));
        }
    }

    fn finish(self, report: String) -> ExperimentOutput {
        ExperimentOutput {
            kind: self.kind,
            report,
            previews: self.previews,
            artifacts: self.artifacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> OutputConfig {
        OutputConfig {
            out_dir: dir.to_path_buf(),
            archive: true,
            preview: true,
            preview_width: 40,
            preview_height: 10,
        }
    }

    #[test]
    fn vapor_pressure_job_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("vp.csv");
        std::fs::write(
            &input,
            "T/℃,p0/kPa,p表/kPa\n30,101.10,81.10\n40,101.10,70.10\n50,101.10,55.10\n60,101.10,200\n",
        )
        .unwrap();
        let job = ExperimentJob::VaporPressure {
            input,
            params: VaporPressureParams::default(),
        };
        let config = config(&dir.path().join("out"));

        let outcome = run_batch(&[job], &config).unwrap();
        assert!(outcome.failures.is_empty());
        let output = &outcome.outputs[0];
        assert_eq!(output.artifacts.len(), 3);
        assert!(output.artifacts.iter().all(|p| p.is_file()));
        assert_eq!(output.previews.len(), 1);
        assert!(output.report.contains("Skipped rows: 1"));
        assert_eq!(outcome.archive, Some(vec!["vapor-pressure.svg".to_string()]));
    }

    #[test]
    fn failing_job_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let emf_csv = dir.path().join("emf.csv");
        std::fs::write(&emf_csv, "e_zn_hg,e_cu_zn,e_cu_hg\n1.0571,1.0963,0.0412\n").unwrap();
        let jobs = vec![
            ExperimentJob::VaporPressure {
                input: dir.path().join("missing.csv"),
                params: VaporPressureParams::default(),
            },
            ExperimentJob::Emf {
                input: emf_csv,
                params: EmfParams::default(),
            },
        ];
        let config = config(&dir.path().join("out"));

        let outcome = run_batch(&jobs, &config).unwrap();
        assert_eq!(outcome.outputs.len(), 1);
        assert_eq!(outcome.outputs[0].kind, ExperimentKind::Emf);
        assert_eq!(outcome.first_error().map(AppError::exit_code), Some(2));
        assert!(config.out_dir.join("emf-readings.csv").is_file());
        assert_eq!(outcome.archive, Some(vec!["emf.svg".to_string()]));
    }
}
