// Accession CLI - validate accession sheets and reconcile them against a catalog

mod catalog;
mod edtf;
mod exit_codes;
mod export;
mod listing;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use accession_recon::ReconError;

use catalog::CatalogCommands;
use exit_codes::{exit_code_for, EXIT_SUCCESS, EXIT_USAGE};
use run::RunArgs;

/// Env var consulted for log directives before `RUST_LOG`.
const LOG_ENV: &str = "ACCESSION_LOG";
const DEFAULT_LOG: &str = "accession=info";

#[derive(Parser)]
#[command(name = "accession")]
#[command(about = "Validate accession sheets and reconcile them against a catalog")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Only log errors and skip the summary
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate sheets, resolve them against the catalog, and write exports
    #[command(after_help = "\
Examples:
  accession run intake.accession.toml items.csv objects.csv views.csv
  accession run intake.accession.toml sheet.csv --files payloads/ --export-dir out/
  accession run intake.accession.toml sheet.csv --offline --json
  accession run intake.accession.toml sheet.csv --strict-dates --fail-on-faults")]
    Run(RunArgs),

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  accession validate intake.accession.toml")]
    Validate {
        /// Path to the .accession.toml config file
        config: PathBuf,
    },

    /// Catalog index snapshots
    #[command(subcommand)]
    Catalog(CatalogCommands),
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  accession-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  accession-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_tracing(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args, cli.quiet),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Catalog(cmd) => catalog::cmd_catalog(cmd, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("every sheet needs a TYPE column (object, item or view)")
            }
            ReconError::Connectivity(_) => {
                Some("run `accession catalog fetch` while online, or pass --offline")
            }
            ReconError::CatalogIndex { .. } => {
                Some("fix the index source; keys must be unique and not both completed and draft")
            }
            _ => None,
        };
        let out = Self { code: exit_code_for(&err), message: err.to_string(), hint: None };
        match hint {
            Some(h) => out.with_hint(h),
            None => out,
        }
    }
}
