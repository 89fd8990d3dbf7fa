use indexmap::IndexMap;
use serde::Serialize;

use crate::analysis::Analysis;
use crate::diagnostics::Diagnostic;
use crate::store::RecordStore;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Spreadsheet headers the engine reads directly.
pub mod columns {
    pub const TYPE: &str = "TYPE";
    pub const OBJECT: &str = "OBJECT";
    pub const ITEM: &str = "ITEM";
    pub const FILENAME: &str = "FILENAME";
    pub const TITLE: &str = "TITLE";
    pub const DATE: &str = "DATE";
    pub const REDACT: &str = "REDACT";
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One untyped row as read from a row source.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// Name of the originating source (usually the file name).
    pub source: String,
    /// 1-based physical line; the header is line 1.
    pub line: u64,
    pub fields: IndexMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Rows in processing order: file-argument order, then physical row order.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub rows: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// Record kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Object,
    Item,
    View,
}

impl RecordKind {
    /// Match a `TYPE` cell: trimmed, case-insensitive.
    pub fn from_type_field(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" => Some(Self::Object),
            "item" => Some(Self::Item),
            "view" => Some(Self::View),
            _ => None,
        }
    }

    /// Column holding this kind's natural key.
    pub fn id_column(&self) -> &'static str {
        match self {
            Self::Object => columns::OBJECT,
            Self::Item => columns::ITEM,
            Self::View => columns::FILENAME,
        }
    }

    /// Column holding the parent's natural key, if this kind has a parent.
    pub fn parent_column(&self) -> Option<&'static str> {
        match self {
            Self::Object => Some(columns::ITEM),
            Self::Item => None,
            Self::View => Some(columns::OBJECT),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Item => write!(f, "item"),
            Self::View => write!(f, "view"),
        }
    }
}

/// Surrogate id assigned by the catalog system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CatalogId(pub String);

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// State shared by every record kind.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub id: String,
    pub catalog_id: Option<CatalogId>,
    pub is_draft: bool,
    pub structural_issue: bool,
    pub value_issue: bool,
    pub thumbnail_ref: Option<CatalogId>,
    pub parent_id: Option<String>,
    pub parent_catalog_id: Option<CatalogId>,
    pub fields: IndexMap<String, String>,
    pub source: String,
    pub source_line: u64,
}

impl Row {
    pub fn new(id: String, fields: IndexMap<String, String>, source: String, source_line: u64) -> Self {
        Self {
            id,
            catalog_id: None,
            is_draft: false,
            structural_issue: false,
            value_issue: false,
            thumbnail_ref: None,
            parent_id: None,
            parent_catalog_id: None,
            fields,
            source,
            source_line,
        }
    }

    /// Field value, empty when the column is absent.
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, column: &str, value: impl Into<String>) {
        self.fields.insert(column.to_string(), value.into());
    }

    pub fn is_faulted(&self) -> bool {
        self.structural_issue || self.value_issue
    }

    /// Resolved against the completed catalog mapping.
    pub fn is_existing(&self) -> bool {
        self.catalog_id.is_some() && !self.is_draft
    }

    /// Not found in either catalog mapping.
    pub fn is_new(&self) -> bool {
        self.catalog_id.is_none()
    }
}

/// A media reference row. `has_file` is set by file resolution.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    #[serde(flatten)]
    pub row: Row,
    pub has_file: bool,
}

/// Closed set of record kinds selected by the `TYPE` column.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Object(Row),
    Item(Row),
    View(View),
}

impl Record {
    /// Build a record from already-normalized fields. The natural key is
    /// read from the kind's id column.
    pub fn new(kind: RecordKind, fields: IndexMap<String, String>, source: String, line: u64) -> Self {
        let id = fields
            .get(kind.id_column())
            .cloned()
            .unwrap_or_default();
        let row = Row::new(id, fields, source, line);
        match kind {
            RecordKind::Object => Self::Object(row),
            RecordKind::Item => Self::Item(row),
            RecordKind::View => Self::View(View { row, has_file: false }),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Object(_) => RecordKind::Object,
            Self::Item(_) => RecordKind::Item,
            Self::View(_) => RecordKind::View,
        }
    }

    pub fn row(&self) -> &Row {
        match self {
            Self::Object(row) | Self::Item(row) => row,
            Self::View(view) => &view.row,
        }
    }

    pub fn row_mut(&mut self) -> &mut Row {
        match self {
            Self::Object(row) | Self::Item(row) => row,
            Self::View(view) => &mut view.row,
        }
    }

    pub fn id(&self) -> &str {
        &self.row().id
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameEntry {
    pub name: String,
    /// Possibly empty; see [`NameEntry::effective_sort_key`].
    pub sort_key: String,
    pub catalog_id: Option<CatalogId>,
}

impl NameEntry {
    /// Sort key as emitted: an empty key falls back to the name itself.
    pub fn effective_sort_key(&self) -> &str {
        if self.sort_key.is_empty() {
            &self.name
        } else {
            &self.sort_key
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub strict_legacy_date_checks: bool,
    pub drop_invalid_views_early: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub analysis: Analysis,
    pub store: RecordStore,
    pub diagnostics: Vec<Diagnostic>,
}
