//! Writes export tables and the JSON result to disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use accession_recon::export::{export_names, export_records, ExportTable};
use accession_recon::{ReconConfig, ReconError, ReconResult};

fn io_err(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(format!("{}: {e}", path.display()))
}

/// Write one table as CSV. The header is written even when there are no rows.
pub fn write_table<W: Write>(out: W, table: &ExportTable) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_table_file(path: &Path, table: &ExportTable) -> Result<(), ReconError> {
    let file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    write_table(std::io::BufWriter::new(file), table).map_err(|e| io_err(path, e))
}

/// Files written by [`write_exports`], with their row counts.
#[derive(Debug, Default)]
pub struct Written {
    pub files: Vec<(PathBuf, usize)>,
}

/// Write every configured export plus the names file into `dir`.
pub fn write_exports(
    config: &ReconConfig,
    result: &ReconResult,
    dir: &Path,
) -> Result<Written, ReconError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let mut written = Written::default();

    for export in &config.exports {
        let table = export_records(export, &result.store);
        let path = dir.join(&export.file);
        write_table_file(&path, &table)?;
        tracing::info!(export = %export.name, rows = table.len(), path = %path.display(), "export written");
        written.files.push((path, table.len()));
    }

    if let Some(ref file) = config.names.export_file {
        let table = export_names(&result.store.names, &config.names.export_headers);
        let path = dir.join(file);
        write_table_file(&path, &table)?;
        tracing::info!(rows = table.len(), path = %path.display(), "names written");
        written.files.push((path, table.len()));
    }

    Ok(written)
}

pub fn result_json(result: &ReconResult) -> Result<String, ReconError> {
    serde_json::to_string_pretty(result)
        .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
}
