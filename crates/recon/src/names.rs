//! Name harvesting from repeatable, `|`-packed name columns.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::KeyIndex;
use crate::config::NAME_KEY_SUFFIX;
use crate::diagnostics::{Code, Diagnostics, Location};
use crate::model::NameEntry;

/// Separator for repeated values inside one cell.
pub const MULTIVALUE_SEPARATOR: char = '|';

/// Result of folding one `(name, sort_key)` pair into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Ignored,
    Inserted,
    /// A previously empty sort key was filled in.
    Updated,
    Unchanged,
    /// The stored sort key differs; the stored value is kept.
    Conflict { kept: String },
}

/// Names seen during one run, in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NameTable {
    entries: IndexMap<String, NameEntry>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, name: &str, sort_key: &str) -> MergeOutcome {
        if name.is_empty() {
            return MergeOutcome::Ignored;
        }
        match self.entries.get_mut(name) {
            None => {
                self.entries.insert(
                    name.to_string(),
                    NameEntry {
                        name: name.to_string(),
                        sort_key: sort_key.to_string(),
                        catalog_id: None,
                    },
                );
                MergeOutcome::Inserted
            }
            Some(entry) => {
                if sort_key.is_empty() || entry.sort_key == sort_key {
                    MergeOutcome::Unchanged
                } else if entry.sort_key.is_empty() {
                    entry.sort_key = sort_key.to_string();
                    MergeOutcome::Updated
                } else {
                    MergeOutcome::Conflict {
                        kept: entry.sort_key.clone(),
                    }
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&NameEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.values()
    }

    /// Entries ordered by name, for export.
    pub fn sorted(&self) -> Vec<&NameEntry> {
        let mut out: Vec<&NameEntry> = self.entries.values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Attach catalog ids from the name index.
    pub fn resolve(&mut self, index: &KeyIndex) {
        for entry in self.entries.values_mut() {
            if let Some(id) = index.get(&entry.name) {
                entry.catalog_id = Some(id.clone());
            }
        }
    }
}

fn split_multivalue(value: &str) -> Vec<&str> {
    value.split(MULTIVALUE_SEPARATOR).map(str::trim).collect()
}

/// Fold every configured name column of one row into `table`.
///
/// Runs on every row whatever its `TYPE`. A field whose sort-key column has a
/// different number of values contributes nothing for this row.
pub fn extract_names(
    fields: &IndexMap<String, String>,
    name_fields: &[String],
    table: &mut NameTable,
    location: &Location,
    diags: &mut Diagnostics,
) {
    for field in name_fields {
        let Some(raw_names) = fields.get(field) else {
            continue;
        };
        let raw_keys = fields
            .get(&format!("{field}{NAME_KEY_SUFFIX}"))
            .map(String::as_str)
            .unwrap_or("");

        let names = split_multivalue(raw_names);
        let keys = if raw_keys.is_empty() {
            vec![""; names.len()]
        } else {
            split_multivalue(raw_keys)
        };

        if names.len() != keys.len() {
            diags.push(
                Code::NameKeyMismatch,
                location.clone(),
                format!(
                    "{field}: {} name(s) but {} key(s); names [{raw_names}], keys [{raw_keys}] not entered",
                    names.len(),
                    keys.len()
                ),
            );
            continue;
        }

        for (name, key) in names.into_iter().zip(keys) {
            if let MergeOutcome::Conflict { kept } = table.merge(name, key) {
                diags.push(
                    Code::NameKeyConflict,
                    location.clone(),
                    format!("[{key}] offered as key for [{name}], already assigned [{kept}]"),
                );
            }
        }
    }
}
