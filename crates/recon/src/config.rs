use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ReconError;
use crate::model::RecordKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub files: Option<FilesConfig>,
    #[serde(default)]
    pub exports: Vec<ExportConfig>,
}

// ---------------------------------------------------------------------------
// Validation policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Treat `*`, `|` and the literal `1909-1910` in DATE as faults before
    /// the EDTF check.
    #[serde(default)]
    pub strict_legacy_date_checks: bool,
    /// Discard a faulted View before file and catalog resolution instead of
    /// resolving and storing it.
    #[serde(default)]
    pub drop_invalid_views_early: bool,
    /// Extension appended to FILENAME values that appear to lack one.
    #[serde(default = "default_assumed_extension")]
    pub assumed_extension: String,
}

fn default_assumed_extension() -> String {
    "jpg".into()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_legacy_date_checks: false,
            drop_invalid_views_early: false,
            assumed_extension: default_assumed_extension(),
        }
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Suffix of the companion column holding sort keys for a name field.
pub const NAME_KEY_SUFFIX: &str = " KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct NamesConfig {
    /// Name columns, in harvesting order. Each may have a `"<field> KEY"`
    /// companion column.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub export_file: Option<String>,
    #[serde(default = "default_name_headers")]
    pub export_headers: [String; 2],
}

fn default_name_headers() -> [String; 2] {
    ["NAME".into(), "NAME KEY".into()]
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            export_file: None,
            export_headers: default_name_headers(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Object,
    Item,
    Media,
    Name,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [Self::Object, Self::Item, Self::Media, Self::Name];
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Item => write!(f, "item"),
            Self::Media => write!(f, "media"),
            Self::Name => write!(f, "name"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub object: Option<IndexSource>,
    #[serde(default)]
    pub item: Option<IndexSource>,
    #[serde(default)]
    pub media: Option<IndexSource>,
    #[serde(default)]
    pub name: Option<IndexSource>,
}

impl CatalogConfig {
    /// Configured sources in a fixed kind order.
    pub fn sources(&self) -> Vec<(IndexKind, &IndexSource)> {
        IndexKind::ALL
            .iter()
            .filter_map(|kind| self.source(*kind).map(|src| (*kind, src)))
            .collect()
    }

    pub fn source(&self, kind: IndexKind) -> Option<&IndexSource> {
        match kind {
            IndexKind::Object => self.object.as_ref(),
            IndexKind::Item => self.item.as_ref(),
            IndexKind::Media => self.media.as_ref(),
            IndexKind::Name => self.name.as_ref(),
        }
    }
}

/// Where one catalog index comes from: a local CSV or a JSON endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSource {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_key_field")]
    pub key_field: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_draft_field")]
    pub draft_field: String,
}

fn default_key_field() -> String {
    "key".into()
}

fn default_id_field() -> String {
    "id".into()
}

fn default_draft_field() -> String {
    "draft".into()
}

// ---------------------------------------------------------------------------
// Files + exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSelect {
    #[default]
    All,
    New,
    Existing,
    Draft,
    /// New objects with at least one View that has a file.
    Ready,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub name: String,
    pub kind: RecordKind,
    pub file: String,
    #[serde(default)]
    pub select: ExportSelect,
    /// Output header -> source column (or `@` pseudo-column), in output order.
    pub columns: IndexMap<String, String>,
}

/// Pseudo-columns an export may read instead of a spreadsheet column.
pub const PSEUDO_COLUMNS: [&str; 6] = [
    "@id",
    "@catalog_id",
    "@parent_id",
    "@parent_catalog_id",
    "@thumbnail",
    "@source_line",
];

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let ext = &self.validation.assumed_extension;
        if ext.is_empty() || ext.contains('.') {
            return Err(ReconError::ConfigValidation(format!(
                "assumed_extension must be a bare extension like \"jpg\", got \"{ext}\""
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.names.fields {
            if field.trim().is_empty() {
                return Err(ReconError::ConfigValidation("empty name field".into()));
            }
            if field.trim() != field {
                return Err(ReconError::ConfigValidation(format!(
                    "name field '{field}' has surrounding whitespace; sheet headers are matched trimmed"
                )));
            }
            if field.ends_with(NAME_KEY_SUFFIX) {
                return Err(ReconError::ConfigValidation(format!(
                    "name field '{field}' is a sort-key column; list the name column instead"
                )));
            }
            if !seen.insert(field.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "name field '{field}' listed twice"
                )));
            }
        }

        for (kind, source) in self.catalog.sources() {
            match (&source.path, &source.url) {
                (Some(_), Some(_)) => {
                    return Err(ReconError::ConfigValidation(format!(
                        "catalog.{kind}: set either path or url, not both"
                    )))
                }
                (None, None) => {
                    return Err(ReconError::ConfigValidation(format!(
                        "catalog.{kind}: path or url is required"
                    )))
                }
                _ => {}
            }
        }

        let mut export_names = HashSet::new();
        let mut export_files = HashSet::new();
        for export in &self.exports {
            if !export_names.insert(export.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "export '{}' defined twice",
                    export.name
                )));
            }
            if !export_files.insert(export.file.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "export '{}': file '{}' is already written by another export",
                    export.name, export.file
                )));
            }
            if export.columns.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "export '{}': at least one column is required",
                    export.name
                )));
            }
            for source in export.columns.values() {
                if source.starts_with('@') && !PSEUDO_COLUMNS.contains(&source.as_str()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "export '{}': unknown pseudo-column '{source}'",
                        export.name
                    )));
                }
            }
            if export.select == ExportSelect::Ready && export.kind != RecordKind::Object {
                return Err(ReconError::ConfigValidation(format!(
                    "export '{}': select = \"ready\" only applies to objects",
                    export.name
                )));
            }
        }

        if let Some(ref names_file) = self.names.export_file {
            if export_files.contains(names_file.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "names.export_file '{names_file}' is already written by an export"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
