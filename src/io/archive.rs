//! Zip the plot directory for sharing.
//!
//! Every file below the directory is stored (Deflate) under its path relative
//! to that directory, with `/` separators.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use glob::Pattern;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::AppError;

/// Compress all files under `dir` into `archive`. Returns the entry names written.
pub fn zip_directory(dir: &Path, archive: &Path) -> Result<Vec<String>, AppError> {
    let files = list_files(dir)?;

    let out = File::create(archive)
        .map_err(|e| AppError::output(format!("Failed to create archive '{}': {e}", archive.display())))?;
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let name = entry_name(dir, &path)?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| AppError::output(format!("Failed to add '{name}' to archive: {e}")))?;
        let mut input = File::open(&path)
            .map(BufReader::new)
            .map_err(|e| AppError::output(format!("Failed to read '{}': {e}", path.display())))?;
        io::copy(&mut input, &mut zip)
            .map_err(|e| AppError::output(format!("Failed to compress '{}': {e}", path.display())))?;
        names.push(name);
    }

    zip.finish()
        .map_err(|e| AppError::output(format!("Failed to finish archive '{}': {e}", archive.display())))?;
    log::info!("Wrote {} ({} files)", archive.display(), names.len());
    Ok(names)
}

/// Regular files below `dir`, sorted.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::output(format!("'{}' is not a directory.", dir.display())));
    }
    let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
    let entries =
        glob::glob(&pattern).map_err(|e| AppError::output(format!("Invalid archive pattern '{pattern}': {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AppError::output(format!("Failed to walk '{}': {e}", dir.display())))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn entry_name(dir: &Path, path: &Path) -> Result<String, AppError> {
    let rel = path
        .strip_prefix(dir)
        .map_err(|_| AppError::output(format!("'{}' is outside '{}'.", path.display(), dir.display())))?;
    let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    Ok(parts.join("/"))
}
