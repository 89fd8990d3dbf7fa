use std::path::Path;

use accession_recon::{FileListing, ReconError};

/// Regular files directly under `dir`. Subdirectories and names that are not
/// valid UTF-8 are skipped.
pub fn list_files(dir: &Path) -> Result<FileListing, ReconError> {
    let read = std::fs::read_dir(dir)
        .map_err(|e| ReconError::Io(format!("cannot list {}: {e}", dir.display())))?;

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| ReconError::Io(format!("{}: {e}", dir.display())))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!(name = ?raw, "skipping non-UTF-8 file name"),
        }
    }

    tracing::debug!(dir = %dir.display(), files = names.len(), "listed payload directory");
    Ok(FileListing::new(names))
}
