//! Tabular exports of clean records.
//!
//! The engine only shapes rows; writing them out is the caller's job.

use serde::Serialize;

use crate::analysis::is_ready_object;
use crate::config::{ExportConfig, ExportSelect};
use crate::model::{CatalogId, Row};
use crate::names::NameTable;
use crate::store::RecordStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn selected(select: ExportSelect, store: &RecordStore, row: &Row) -> bool {
    match select {
        ExportSelect::All => true,
        ExportSelect::New => row.is_new(),
        ExportSelect::Existing => row.is_existing(),
        ExportSelect::Draft => row.is_draft,
        ExportSelect::Ready => is_ready_object(store, row),
    }
}

fn id_or_empty(id: &Option<CatalogId>) -> String {
    id.as_ref().map(|c| c.0.clone()).unwrap_or_default()
}

/// Value of one export column. `@` sources read record state; anything else
/// is a spreadsheet column.
fn cell(row: &Row, source: &str) -> String {
    match source {
        "@id" => row.id.clone(),
        "@catalog_id" => id_or_empty(&row.catalog_id),
        "@parent_id" => row.parent_id.clone().unwrap_or_default(),
        "@parent_catalog_id" => id_or_empty(&row.parent_catalog_id),
        "@thumbnail" => id_or_empty(&row.thumbnail_ref),
        "@source_line" => row.source_line.to_string(),
        column => row.field(column).to_string(),
    }
}

/// Build one configured export. Faulted and rejected records never appear.
pub fn export_records(export: &ExportConfig, store: &RecordStore) -> ExportTable {
    let headers = export.columns.keys().cloned().collect();
    let rows = store
        .rows(export.kind)
        .filter(|row| !row.is_faulted())
        .filter(|row| selected(export.select, store, row))
        .map(|row| export.columns.values().map(|src| cell(row, src)).collect())
        .collect();
    ExportTable { headers, rows }
}

/// Name table export, ordered by name. Empty sort keys are written as the
/// name itself.
pub fn export_names(names: &NameTable, headers: &[String; 2]) -> ExportTable {
    ExportTable {
        headers: headers.to_vec(),
        rows: names
            .sorted()
            .into_iter()
            .map(|n| vec![n.name.clone(), n.effective_sort_key().to_string()])
            .collect(),
    }
}
