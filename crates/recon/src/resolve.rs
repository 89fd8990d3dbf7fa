//! Catalog and file resolution.

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::catalog::{CatalogIndex, KeyIndex};
use crate::config::IndexKind;
use crate::diagnostics::{Code, Diagnostics, Location};
use crate::model::{columns, Record, RecordKind, Row, View};

/// Completed mapping lookup. Returns whether the row was found.
pub fn resolve_self(row: &mut Row, completed: &KeyIndex) -> bool {
    match completed.get(&row.id) {
        Some(id) => {
            row.catalog_id = Some(id.clone());
            true
        }
        None => false,
    }
}

/// Draft mapping lookup, skipped when the row already resolved as completed.
pub fn resolve_draft(row: &mut Row, drafts: &KeyIndex) -> bool {
    if row.catalog_id.is_some() {
        return false;
    }
    match drafts.get(&row.id) {
        Some(id) => {
            row.catalog_id = Some(id.clone());
            row.is_draft = true;
            true
        }
        None => false,
    }
}

pub fn resolve_parent(row: &mut Row, parents: &KeyIndex) -> bool {
    let Some(parent_id) = row.parent_id.as_deref() else {
        return false;
    };
    match parents.get(parent_id) {
        Some(id) => {
            row.parent_catalog_id = Some(id.clone());
            true
        }
        None => false,
    }
}

pub fn resolve_thumbnail(row: &mut Row, media: &KeyIndex) -> bool {
    match media.get(row.field(columns::FILENAME)) {
        Some(id) => {
            row.thumbnail_ref = Some(id.clone());
            true
        }
        None => false,
    }
}

/// Run the catalog lookups that apply to the record's kind.
///
/// Parents resolve against the completed mapping first and fall back to the
/// parent kind's drafts, since a parent is often created as a stub. A View's
/// media match is its own `catalog_id`, so Views never take a thumbnail.
pub fn resolve_record(record: &mut Record, catalog: &CatalogIndex) {
    let (own, parent) = match record.kind() {
        RecordKind::Item => (IndexKind::Item, None),
        RecordKind::Object => (IndexKind::Object, Some(IndexKind::Item)),
        RecordKind::View => (IndexKind::Media, Some(IndexKind::Object)),
    };
    let thumbnail = record.kind() != RecordKind::View;
    let row = record.row_mut();

    if !resolve_self(row, catalog.completed(own)) {
        resolve_draft(row, catalog.drafts(own));
    }
    if let Some(parent) = parent {
        if !resolve_parent(row, catalog.completed(parent)) {
            resolve_parent(row, catalog.drafts(parent));
        }
    }
    if thumbnail {
        resolve_thumbnail(row, catalog.completed(IndexKind::Media));
    }
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

/// Filenames available for Views, as listed from the payload directory.
#[derive(Debug, Clone, Default)]
pub struct FileListing {
    names: BTreeSet<String>,
}

impl FileListing {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Entries starting with `prefix`, in name order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.names
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |n| n.starts_with(prefix))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMatch {
    Exact,
    /// The only entry sharing the stem; the View now uses this name.
    Renamed { from: String },
    Ambiguous(Vec<String>),
    Missing,
}

fn stem(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename)
}

/// Locate the View's file. A single stem match is adopted silently since the
/// extension in the sheet was a guess; several matches are a value fault.
pub fn resolve_file(view: &mut View, files: &FileListing, diags: &mut Diagnostics) -> FileMatch {
    let filename = view.row.field(columns::FILENAME).to_string();
    if filename.is_empty() {
        return FileMatch::Missing;
    }
    if files.contains(&filename) {
        view.has_file = true;
        return FileMatch::Exact;
    }

    let stem = stem(&filename);
    if stem.is_empty() {
        return FileMatch::Missing;
    }
    let candidates: Vec<String> = files.with_prefix(stem).map(str::to_string).collect();
    match candidates.len() {
        0 => FileMatch::Missing,
        1 => {
            let found = candidates.into_iter().next().unwrap_or_default();
            diags.push(
                Code::FileRenamed,
                Location::row(RecordKind::View, &view.row),
                format!("FILENAME [{filename}] matched [{found}] on disk; using it"),
            );
            view.row.set_field(columns::FILENAME, found.clone());
            view.row.id = found;
            view.has_file = true;
            FileMatch::Renamed { from: filename }
        }
        _ => {
            view.row.value_issue = true;
            diags.push(
                Code::AmbiguousFile,
                Location::row(RecordKind::View, &view.row),
                format!(
                    "FILENAME [{filename}] matches several files: {}",
                    candidates.join(", ")
                ),
            );
            FileMatch::Ambiguous(candidates)
        }
    }
}
