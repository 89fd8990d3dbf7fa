//! `accession-recon`: hierarchical record reconciliation and validation engine.
//!
//! Pure engine crate: receives pre-loaded rows and catalog entries, returns a
//! keyed record store, diagnostics and an analysis. No network or filesystem
//! access; the date grammar and file listing are supplied by the caller.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod names;
pub mod normalize;
pub mod resolve;
pub mod store;
pub mod validate;

pub use analysis::Analysis;
pub use catalog::CatalogIndex;
pub use config::ReconConfig;
pub use diagnostics::{Diagnostic, Severity};
pub use engine::{load_csv_rows, run, Collaborators};
pub use error::ReconError;
pub use model::{RawRow, ReconInput, ReconResult, Record, RecordKind};
pub use resolve::FileListing;
pub use store::RecordStore;
pub use validate::DateValidator;
