//! Batch manifest loading.
//!
//! A manifest is a JSON document listing experiments with their inputs and
//! constants (see `domain::Manifest`). Relative paths are resolved against the
//! manifest's own directory so a data folder can be moved as a unit.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::domain::{ExperimentJob, Manifest, slugify};
use crate::error::AppError;

pub fn load_manifest(path: &Path) -> Result<Manifest, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open manifest '{}': {e}", path.display())))?;
    let mut manifest: Manifest = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid manifest '{}': {e}", path.display())))?;

    if manifest.experiments.is_empty() {
        return Err(AppError::input(format!("Manifest '{}' lists no experiments.", path.display())));
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for job in &mut manifest.experiments {
        job.resolve_paths(base);
    }
    if let Some(out) = manifest.out.as_mut().filter(|p| p.is_relative()) {
        *out = base.join(&*out);
    }

    check_output_stems(&manifest.experiments)?;
    Ok(manifest)
}

/// Output file stems a job will write (one per combustion series).
pub fn output_stems(job: &ExperimentJob) -> Vec<String> {
    match job {
        ExperimentJob::Combustion { series, .. } => series
            .iter()
            .map(|s| format!("{}-{}", job.kind().slug(), slugify(&s.name)))
            .chain(std::iter::once(job.kind().slug().to_string()))
            .collect(),
        _ => vec![job.kind().slug().to_string()],
    }
}

/// Reject job lists where two outputs share a file stem (they would overwrite each other).
pub fn check_output_stems(jobs: &[ExperimentJob]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for job in jobs {
        for stem in output_stems(job) {
            if !seen.insert(stem.clone()) {
                return Err(AppError::input(format!(
                    "Outputs '{stem}' would be written twice; use one job per experiment and unique series names."
                )));
            }
        }
    }
    Ok(())
}
