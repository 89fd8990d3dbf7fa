//! `accession run` and `accession validate`: config-driven sheet reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;

use accession_recon::engine::{load_csv_rows, run, Collaborators};
use accession_recon::{ReconConfig, ReconInput, ReconResult, RecordKind};

use crate::catalog::load_catalog;
use crate::exit_codes::{EXIT_FAULTS, EXIT_RUNTIME, EXIT_USAGE};
use crate::{edtf, export, listing, CliError};

#[derive(Args)]
pub struct RunArgs {
    /// Path to the .accession.toml config file
    pub config: PathBuf,

    /// Sheets to ingest, in order. Parents must appear before children.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Payload directory to match View filenames against (overrides [files].dir)
    #[arg(long, value_name = "DIR")]
    pub files: Option<PathBuf>,

    /// Skip catalog lookups; every record is classified as new
    #[arg(long)]
    pub offline: bool,

    /// Treat legacy date notation (`*`, `|`, `1909-1910`) as faults
    #[arg(long)]
    pub strict_dates: bool,

    /// Discard faulted views before file and catalog resolution
    #[arg(long)]
    pub drop_invalid_views: bool,

    /// Directory for configured exports (default: the config file's directory)
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exit 1 when any row is faulted
    #[arg(long)]
    pub fail_on_faults: bool,
}

fn read_input(path: &Path, what: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::NotFound {
            EXIT_USAGE
        } else {
            EXIT_RUNTIME
        };
        CliError {
            code,
            message: format!("cannot read {what} {}: {e}", path.display()),
            hint: None,
        }
    })
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_input(config_path, "config")?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

pub fn cmd_run(args: RunArgs, quiet: bool) -> Result<(), CliError> {
    let mut config = load_config(&args.config)?;
    if args.strict_dates {
        config.validation.strict_legacy_date_checks = true;
    }
    if args.drop_invalid_views {
        config.validation.drop_invalid_views_early = true;
    }

    let base_dir = config_dir(&args.config);

    // Boundary I/O completes before the scan starts.
    let catalog = load_catalog(&config, base_dir, args.offline)?;

    let files_dir = match (&args.files, &config.files) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Some(files)) => Some(base_dir.join(&files.dir)),
        (None, None) => None,
    };
    let files = files_dir
        .as_deref()
        .map(listing::list_files)
        .transpose()?;

    let mut input = ReconInput::default();
    for path in &args.inputs {
        let data = read_input(path, "sheet")?;
        let rows = load_csv_rows(&path.display().to_string(), &data)?;
        tracing::info!(sheet = %path.display(), rows = rows.len(), "sheet loaded");
        input.rows.extend(rows);
    }

    let result = run(
        &config,
        &input,
        Collaborators {
            catalog: &catalog,
            dates: &edtf::is_valid_edtf,
            files: files.as_ref(),
        },
    );

    if !config.exports.is_empty() || config.names.export_file.is_some() {
        let dir = args.export_dir.as_deref().unwrap_or(base_dir);
        let written = export::write_exports(&config, &result, dir)?;
        if !quiet {
            for (path, rows) in &written.files {
                eprintln!("wrote {} ({rows} rows)", path.display());
            }
        }
    }

    if args.output.is_some() || args.json {
        let json_str = export::result_json(&result)?;
        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str).map_err(|e| CliError {
                code: EXIT_RUNTIME,
                message: format!("cannot write output: {e}"),
                hint: None,
            })?;
            if !quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if args.json {
            println!("{json_str}");
        }
    }

    if !quiet {
        print_summary(&result, files.is_some());
    }

    let faulted = result.analysis.faulted_total() + result.analysis.discarded_views;
    if args.fail_on_faults && faulted > 0 {
        return Err(CliError {
            code: EXIT_FAULTS,
            message: format!("{faulted} faulted row(s)"),
            hint: Some("run without --fail-on-faults to write exports of the clean rows only".into()),
        });
    }

    Ok(())
}

fn print_summary(result: &ReconResult, with_files: bool) {
    let a = &result.analysis;
    eprintln!(
        "{}: {} items, {} objects, {} views; {} faulted, {} rejected, {} discarded",
        result.meta.config_name,
        a.items.total,
        a.objects.total,
        a.views.total,
        a.faulted_total(),
        a.rejected,
        a.discarded_views,
    );
    for kind in [RecordKind::Item, RecordKind::Object] {
        let s = a.kind(kind);
        eprintln!(
            "  {kind}s: {} existing, {} draft, {} new, {} with thumbnail",
            s.existing, s.drafts, s.new, s.with_thumbnail,
        );
    }
    eprintln!(
        "  views: {} existing, {} draft, {} new",
        a.views.existing, a.views.drafts, a.views.new,
    );
    eprintln!("  names: {} ({} in catalog)", a.names.total, a.names.existing);
    if with_files {
        eprintln!("  files: {} of {} views have a file", a.views_with_file, a.views.total);
    }
    eprintln!("  ready: {} new object(s) with media", a.ready_total());
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' with {} name field(s), {} catalog source(s), {} export(s)",
        config.name,
        config.names.fields.len(),
        config.catalog.sources().len(),
        config.exports.len(),
    );
    Ok(())
}
