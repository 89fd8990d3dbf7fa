//! Read-only natural-key -> surrogate-id mappings for the external catalog.
//!
//! Each index kind has a completed mapping and a draft mapping. Drafts are
//! placeholder entries (e.g. a parent created as a stub) still missing
//! required fields. The builder refuses inputs the engine cannot trust:
//! blank keys or ids, duplicate keys, and keys present in both mappings of a
//! kind. It reports these and never repairs them.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::config::{IndexKind, IndexSource};
use crate::error::ReconError;
use crate::model::CatalogId;

#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    map: HashMap<String, CatalogId>,
}

impl KeyIndex {
    pub fn get(&self, key: &str) -> Option<&CatalogId> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// One row of a catalog index input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: String,
    pub id: String,
    pub draft: bool,
}

impl IndexEntry {
    pub fn completed(key: &str, id: &str) -> Self {
        Self { key: key.into(), id: id.into(), draft: false }
    }

    pub fn draft(key: &str, id: &str) -> Self {
        Self { key: key.into(), id: id.into(), draft: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    completed: [KeyIndex; 4],
    drafts: [KeyIndex; 4],
}

fn slot(kind: IndexKind) -> usize {
    match kind {
        IndexKind::Object => 0,
        IndexKind::Item => 1,
        IndexKind::Media => 2,
        IndexKind::Name => 3,
    }
}

impl CatalogIndex {
    /// An index with no entries; every record resolves as new.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> CatalogIndexBuilder {
        CatalogIndexBuilder::default()
    }

    pub fn completed(&self, kind: IndexKind) -> &KeyIndex {
        &self.completed[slot(kind)]
    }

    pub fn drafts(&self, kind: IndexKind) -> &KeyIndex {
        &self.drafts[slot(kind)]
    }
}

#[derive(Debug, Default)]
pub struct CatalogIndexBuilder {
    index: CatalogIndex,
}

impl CatalogIndexBuilder {
    /// Add entries for one kind. Keys and ids are trimmed, matching the
    /// trimmed row fields they are looked up with. Fails on the first entry
    /// that would make the index inconsistent; `position` in messages is the
    /// 1-based entry number.
    pub fn add_entries(
        &mut self,
        kind: IndexKind,
        entries: impl IntoIterator<Item = IndexEntry>,
    ) -> Result<&mut Self, ReconError> {
        let i = slot(kind);
        for (n, entry) in entries.into_iter().enumerate() {
            let position = n + 1;
            let key = entry.key.trim();
            let id = entry.id.trim();
            if key.is_empty() {
                return Err(ReconError::catalog(kind, format!("entry {position}: blank key")));
            }
            if id.is_empty() {
                return Err(ReconError::catalog(
                    kind,
                    format!("entry {position}: blank id for key '{key}'"),
                ));
            }

            let (target, other, state) = if entry.draft {
                (&mut self.index.drafts[i], &self.index.completed[i], "draft")
            } else {
                (&mut self.index.completed[i], &self.index.drafts[i], "completed")
            };

            if other.contains(key) {
                return Err(ReconError::catalog(
                    kind,
                    format!("key '{key}' is both completed and draft"),
                ));
            }

            match target.map.entry(key.to_string()) {
                Entry::Occupied(existing) => {
                    return Err(ReconError::catalog(
                        kind,
                        format!(
                            "duplicate {state} key '{}' (ids {} and {id})",
                            existing.key(),
                            existing.get(),
                        ),
                    ));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(CatalogId(id.to_string()));
                }
            }
        }
        Ok(self)
    }

    pub fn build(self) -> CatalogIndex {
        self.index
    }
}

/// Interpret a draft flag cell. Unrecognised values count as not-draft.
pub fn parse_draft_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "draft"
    )
}

/// Read index entries from CSV using the source's field names.
pub fn load_csv_entries(
    kind: IndexKind,
    csv_data: &str,
    source: &IndexSource,
) -> Result<Vec<IndexEntry>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::catalog(kind, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| headers.iter().position(|h| h == name);
    let key_idx = idx(&source.key_field)
        .ok_or_else(|| ReconError::catalog(kind, format!("missing column '{}'", source.key_field)))?;
    let id_idx = idx(&source.id_field)
        .ok_or_else(|| ReconError::catalog(kind, format!("missing column '{}'", source.id_field)))?;
    let draft_idx = idx(&source.draft_field);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::catalog(kind, e.to_string()))?;
        entries.push(IndexEntry {
            key: record.get(key_idx).unwrap_or("").trim().to_string(),
            id: record.get(id_idx).unwrap_or("").trim().to_string(),
            draft: draft_idx
                .and_then(|i| record.get(i))
                .map(parse_draft_flag)
                .unwrap_or(false),
        });
    }
    Ok(entries)
}
