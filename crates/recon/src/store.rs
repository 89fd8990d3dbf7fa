use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Record, RecordKind, Row, View};
use crate::names::NameTable;

/// Records of one run, keyed by natural id in insertion order.
///
/// The first record with a given id owns the key. A record that cannot take
/// a key (empty id, or the key is already owned) is flagged as a structural
/// fault and kept in `rejected` so it still shows up in reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordStore {
    pub objects: IndexMap<String, Row>,
    pub items: IndexMap<String, Row>,
    pub views: IndexMap<String, View>,
    pub names: NameTable,
    pub rejected: Vec<Record>,
    /// Views dropped before resolution under the drop-early policy.
    pub discarded_views: usize,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: RecordKind, id: &str) -> bool {
        match kind {
            RecordKind::Object => self.objects.contains_key(id),
            RecordKind::Item => self.items.contains_key(id),
            RecordKind::View => self.views.contains_key(id),
        }
    }

    pub fn get(&self, kind: RecordKind, id: &str) -> Option<&Row> {
        match kind {
            RecordKind::Object => self.objects.get(id),
            RecordKind::Item => self.items.get(id),
            RecordKind::View => self.views.get(id).map(|v| &v.row),
        }
    }

    /// Insert a record. Returns `false` if it went to `rejected`.
    pub fn insert(&mut self, mut record: Record) -> bool {
        let id = record.id().to_string();
        if id.is_empty() || self.contains(record.kind(), &id) {
            record.row_mut().structural_issue = true;
            self.rejected.push(record);
            return false;
        }
        match record {
            Record::Object(row) => {
                self.objects.insert(id, row);
            }
            Record::Item(row) => {
                self.items.insert(id, row);
            }
            Record::View(view) => {
                self.views.insert(id, view);
            }
        }
        true
    }

    /// Stored rows of one kind, in insertion order.
    pub fn rows(&self, kind: RecordKind) -> Box<dyn Iterator<Item = &Row> + '_> {
        match kind {
            RecordKind::Object => Box::new(self.objects.values()),
            RecordKind::Item => Box::new(self.items.values()),
            RecordKind::View => Box::new(self.views.values().map(|v| &v.row)),
        }
    }

    /// Stored Views whose parent is `object_id`.
    pub fn views_of<'a>(&'a self, object_id: &'a str) -> impl Iterator<Item = &'a View> + 'a {
        self.views
            .values()
            .filter(move |v| v.row.parent_id.as_deref() == Some(object_id))
    }

    pub fn rejected_of(&self, kind: RecordKind) -> impl Iterator<Item = &Record> + '_ {
        self.rejected.iter().filter(move |r| r.kind() == kind)
    }
}
