//! Catalog index loading: local CSV snapshots or JSON endpoints.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Subcommand;

use accession_recon::catalog::{load_csv_entries, parse_draft_flag, CatalogIndex, IndexEntry};
use accession_recon::config::{IndexKind, IndexSource, ReconConfig};
use accession_recon::ReconError;

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Download every url-backed catalog index into local CSV snapshots
    #[command(after_help = "\
Examples:
  accession catalog fetch intake.accession.toml --out index/
  accession run intake.accession.toml sheet.csv   # after pointing [catalog.*] path at index/*.csv")]
    Fetch {
        /// Path to the .accession.toml config file
        config: PathBuf,

        /// Directory to write <kind>.csv snapshots into
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },
}

pub fn cmd_catalog(cmd: CatalogCommands, quiet: bool) -> Result<(), CliError> {
    match cmd {
        CatalogCommands::Fetch { config, out } => cmd_catalog_fetch(config, out, quiet),
    }
}

fn cmd_catalog_fetch(config_path: PathBuf, out: PathBuf, quiet: bool) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
        CliError::args(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let config = ReconConfig::from_toml(&config_str)?;

    let remote: Vec<(IndexKind, &IndexSource, &str)> = config
        .catalog
        .sources()
        .into_iter()
        .filter_map(|(kind, source)| source.url.as_deref().map(|url| (kind, source, url)))
        .collect();
    if remote.is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "no catalog source has a url".into(),
            hint: Some("add `url = \"...\"` under a [catalog.<kind>] table".into()),
        });
    }

    std::fs::create_dir_all(&out)
        .map_err(|e| ReconError::Io(format!("{}: {e}", out.display())))?;

    // Fetch everything and check consistency before writing anything.
    let client = CatalogClient::new()?;
    let mut builder = CatalogIndex::builder();
    let mut fetched = Vec::with_capacity(remote.len());
    for (kind, source, url) in remote {
        let entries = client.fetch_entries(kind, url, source)?;
        builder.add_entries(kind, entries.clone())?;
        fetched.push((kind, entries));
    }

    for (kind, entries) in fetched {
        let path = out.join(format!("{kind}.csv"));
        write_snapshot(&path, &entries)?;
        if !quiet {
            eprintln!("wrote {} ({} entries)", path.display(), entries.len());
        }
    }
    Ok(())
}

pub const USER_AGENT: &str = concat!("accession/", env!("CARGO_PKG_VERSION"));

/// Single-attempt HTTP client for catalog endpoints.
pub struct CatalogClient {
    http: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new() -> Result<Self, ReconError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ReconError::Connectivity(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// GET `url` and read a JSON array of entries using the source's field
    /// names.
    pub fn fetch_entries(
        &self,
        kind: IndexKind,
        url: &str,
        source: &IndexSource,
    ) -> Result<Vec<IndexEntry>, ReconError> {
        tracing::info!(%kind, url, "fetching catalog index");
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| ReconError::Connectivity(format!("{kind}: {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReconError::Connectivity(format!(
                "{kind}: {url}: HTTP {}",
                status.as_u16()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .map_err(|e| ReconError::Connectivity(format!("{kind}: {url}: invalid JSON body: {e}")))?;
        entries_from_json(kind, &body, source)
    }
}

/// Ids and keys may arrive as JSON strings or numbers.
fn scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn draft_flag(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(serde_json::Value::String(s)) => parse_draft_flag(s),
        _ => false,
    }
}

pub fn entries_from_json(
    kind: IndexKind,
    body: &serde_json::Value,
    source: &IndexSource,
) -> Result<Vec<IndexEntry>, ReconError> {
    let items = body.as_array().ok_or_else(|| {
        ReconError::Connectivity(format!("{kind}: expected a JSON array of entries"))
    })?;

    let mut entries = Vec::with_capacity(items.len());
    for (n, item) in items.iter().enumerate() {
        let position = n + 1;
        let obj = item.as_object().ok_or_else(|| {
            ReconError::Connectivity(format!("{kind}: entry {position} is not an object"))
        })?;
        let field = |name: &str| {
            obj.get(name).and_then(scalar).ok_or_else(|| ReconError::CatalogIndex {
                kind: kind.to_string(),
                reason: format!("entry {position}: missing '{name}'"),
            })
        };
        entries.push(IndexEntry {
            key: field(&source.key_field)?,
            id: field(&source.id_field)?,
            draft: draft_flag(obj.get(&source.draft_field)),
        });
    }
    Ok(entries)
}

/// Entries for one configured source, from disk or over HTTP.
pub fn load_entries(
    kind: IndexKind,
    source: &IndexSource,
    base_dir: &Path,
    client: &CatalogClient,
) -> Result<Vec<IndexEntry>, ReconError> {
    match (&source.path, &source.url) {
        (Some(path), _) => {
            let path = base_dir.join(path);
            let data = std::fs::read_to_string(&path).map_err(|e| ReconError::CatalogIndex {
                kind: kind.to_string(),
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
            load_csv_entries(kind, &data, source)
        }
        (None, Some(url)) => client.fetch_entries(kind, url, source),
        (None, None) => Err(ReconError::ConfigValidation(format!(
            "catalog.{kind}: path or url is required"
        ))),
    }
}

/// Build the index for a run. Offline runs get an empty index, so every
/// record classifies as new.
pub fn load_catalog(
    config: &ReconConfig,
    base_dir: &Path,
    offline: bool,
) -> Result<CatalogIndex, ReconError> {
    if offline {
        tracing::info!("offline: catalog lookups skipped");
        return Ok(CatalogIndex::empty());
    }

    let client = CatalogClient::new()?;
    let mut builder = CatalogIndex::builder();
    for (kind, source) in config.catalog.sources() {
        let entries = load_entries(kind, source, base_dir, &client)?;
        let drafts = entries.iter().filter(|e| e.draft).count();
        tracing::info!(%kind, entries = entries.len(), drafts, "catalog index loaded");
        builder.add_entries(kind, entries)?;
    }
    Ok(builder.build())
}

/// Write a `key,id,draft` snapshot that a `path` source can read back.
pub fn write_snapshot(path: &Path, entries: &[IndexEntry]) -> Result<(), ReconError> {
    let io_err = |e: &dyn std::fmt::Display| ReconError::Io(format!("{}: {e}", path.display()));

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| io_err(&e))?;
    writer.write_record(["key", "id", "draft"]).map_err(|e| io_err(&e))?;
    for entry in entries {
        let draft = if entry.draft { "true" } else { "false" };
        writer
            .write_record([entry.key.as_str(), entry.id.as_str(), draft])
            .map_err(|e| io_err(&e))?;
    }
    writer.flush().map_err(|e| io_err(&e))?;
    Ok(())
}
