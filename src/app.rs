//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - turns them into experiment jobs
//! - runs the pipeline and prints reports/previews
//! - writes sample data for `labfit sample`

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::cli::{
    BatchArgs, CombustionArgs, Command, DEFAULT_OUT_DIR, EmfArgs, OutputArgs, SampleArgs, SurfaceTensionArgs,
    VaporPressureArgs,
};
use crate::domain::{
    CombustionParams, EmfParams, ExperimentJob, OutputConfig, SurfaceTensionParams, VaporPressureParams,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `labfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::SurfaceTension(args) => run_jobs(vec![surface_tension_job(&args)], output_config(&args.output, None)),
        Command::Combustion(args) => run_jobs(vec![combustion_job(&args)], output_config(&args.output, None)),
        Command::Emf(args) => run_jobs(vec![emf_job(&args)], output_config(&args.output, None)),
        Command::VaporPressure(args) => run_jobs(vec![vapor_pressure_job(&args)], output_config(&args.output, None)),
        Command::Batch(args) => handle_batch(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let manifest = crate::io::load_manifest(&args.manifest)?;
    info!(
        "Loaded {} experiment(s) from {}",
        manifest.experiments.len(),
        args.manifest.display()
    );
    let config = output_config(&args.output, manifest.out);
    run_jobs(manifest.experiments, config)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let set = crate::data::write_sample_data(&args.out, args.seed)?;
    println!(
        "Wrote {} input files to {}. Run them with:\n  labfit batch {}",
        set.files.len(),
        args.out.display(),
        set.manifest.display()
    );
    Ok(())
}

/// Run jobs, print every successful report, and fail with the first error.
fn run_jobs(jobs: Vec<ExperimentJob>, config: OutputConfig) -> Result<(), AppError> {
    let outcome = pipeline::run_batch(&jobs, &config)?;

    for output in &outcome.outputs {
        println!("{}", output.report);
        for preview in &output.previews {
            println!("{preview}");
        }
    }
    if let Some(entries) = &outcome.archive {
        println!(
            "Archived {} plot(s) to {}",
            entries.len(),
            config.archive_path().display()
        );
    }

    match outcome.first_error() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// `--out` wins over the manifest's `out`, which wins over the default.
pub fn output_config(args: &OutputArgs, manifest_out: Option<PathBuf>) -> OutputConfig {
    OutputConfig {
        out_dir: args
            .out
            .clone()
            .or(manifest_out)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        archive: !args.no_archive,
        preview: args.preview,
        preview_width: args.width,
        preview_height: args.height,
    }
}

pub fn surface_tension_job(args: &SurfaceTensionArgs) -> ExperimentJob {
    ExperimentJob::SurfaceTension {
        water: args.water.clone(),
        solution: args.solution.clone(),
        params: SurfaceTensionParams {
            sigma_water: args.sigma_water,
            temperature_c: args.temperature,
            sigma_degree: args.sigma_degree,
            gamma_degree: args.gamma_degree,
        },
    }
}

pub fn combustion_job(args: &CombustionArgs) -> ExperimentJob {
    ExperimentJob::Combustion {
        series: args.series.clone(),
        params: CombustionParams {
            segment_len: args.segment_len,
            before_degree: args.before_degree,
            during_degree: args.during_degree,
            after_degree: args.after_degree,
        },
    }
}

pub fn emf_job(args: &EmfArgs) -> ExperimentJob {
    ExperimentJob::Emf {
        input: args.input.clone(),
        params: EmfParams {
            temperature_c: args.temperature,
            c_cu: args.c_cu,
            gamma_cu: args.gamma_cu,
            c_zn: args.c_zn,
            gamma_zn: args.gamma_zn,
            ..EmfParams::default()
        },
    }
}

pub fn vapor_pressure_job(args: &VaporPressureArgs) -> ExperimentJob {
    ExperimentJob::VaporPressure {
        input: args.input.clone(),
        params: VaporPressureParams {
            reference_boiling_c: args.reference_boiling,
            local_pressure_kpa: args.local_pressure,
            standard_pressure_kpa: args.standard_pressure,
            reference_enthalpy_kj: args.reference_enthalpy,
            ..VaporPressureParams::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn out_flag_overrides_manifest() {
        let cli = Cli::try_parse_from(["labfit", "batch", "m.json", "--out", "here"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        let config = output_config(&args.output, Some(PathBuf::from("there")));
        assert_eq!(config.out_dir, PathBuf::from("here"));
        assert!(config.archive);

        let cli = Cli::try_parse_from(["labfit", "batch", "m.json", "--no-archive"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(output_config(&args.output, Some(PathBuf::from("there"))).out_dir, PathBuf::from("there"));
        assert_eq!(output_config(&args.output, None).out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert!(!output_config(&args.output, None).archive);
    }

    #[test]
    fn emf_flags_keep_default_coefficients() {
        let cli = Cli::try_parse_from(["labfit", "emf", "--input", "e.csv", "--temperature", "20"]).unwrap();
        let Command::Emf(args) = cli.command else {
            panic!("expected emf");
        };
        let ExperimentJob::Emf { params, .. } = emf_job(&args) else {
            panic!("expected emf job");
        };
        assert_eq!(params.temperature_c, 20.0);
        assert_eq!(params.alpha_zn, EmfParams::default().alpha_zn);
    }
}
