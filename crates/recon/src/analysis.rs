use serde::Serialize;

use crate::model::{RecordKind, Row};
use crate::store::RecordStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    /// Stored plus rejected rows of this kind.
    pub total: usize,
    pub faulted: usize,
    pub existing: usize,
    pub drafts: usize,
    pub new: usize,
    /// Items and Objects only; a View's media match is its `catalog_id`.
    pub with_thumbnail: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameSummary {
    pub total: usize,
    pub existing: usize,
    pub without_sort_key: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub objects: KindSummary,
    pub items: KindSummary,
    pub views: KindSummary,
    pub views_with_file: usize,
    pub names: NameSummary,
    pub rejected: usize,
    pub discarded_views: usize,
    /// Clean new objects with at least one clean View that has a file, in
    /// store order.
    pub ready_objects: Vec<String>,
}

impl Analysis {
    pub fn kind(&self, kind: RecordKind) -> &KindSummary {
        match kind {
            RecordKind::Object => &self.objects,
            RecordKind::Item => &self.items,
            RecordKind::View => &self.views,
        }
    }

    pub fn ready_total(&self) -> usize {
        self.ready_objects.len()
    }

    pub fn faulted_total(&self) -> usize {
        self.objects.faulted + self.items.faulted + self.views.faulted
    }
}

fn summarize<'a>(rows: impl Iterator<Item = &'a Row>) -> KindSummary {
    let mut s = KindSummary::default();
    for row in rows {
        s.total += 1;
        if row.is_faulted() {
            s.faulted += 1;
        }
        if row.is_existing() {
            s.existing += 1;
        }
        if row.is_draft {
            s.drafts += 1;
        }
        if row.is_new() {
            s.new += 1;
        }
        if row.thumbnail_ref.is_some() {
            s.with_thumbnail += 1;
        }
    }
    s
}

/// Whether an object would go into the "ready to create" batch: a clean new
/// object with at least one clean View that has a file.
pub fn is_ready_object(store: &RecordStore, object: &Row) -> bool {
    object.is_new()
        && !object.is_faulted()
        && store
            .views_of(&object.id)
            .any(|v| v.has_file && !v.row.is_faulted())
}

/// Derive summary counts. Never mutates the store.
pub fn analyze(store: &RecordStore) -> Analysis {
    let kind_summary = |kind: RecordKind| {
        summarize(
            store
                .rows(kind)
                .chain(store.rejected_of(kind).map(|r| r.row())),
        )
    };

    let ready_objects = store
        .objects
        .values()
        .filter(|o| is_ready_object(store, o))
        .map(|o| o.id.clone())
        .collect();

    Analysis {
        objects: kind_summary(RecordKind::Object),
        items: kind_summary(RecordKind::Item),
        views: kind_summary(RecordKind::View),
        views_with_file: store.views.values().filter(|v| v.has_file).count(),
        names: NameSummary {
            total: store.names.len(),
            existing: store.names.iter().filter(|n| n.catalog_id.is_some()).count(),
            without_sort_key: store.names.iter().filter(|n| n.sort_key.is_empty()).count(),
        },
        rejected: store.rejected.len(),
        discarded_views: store.discarded_views,
        ready_objects,
    }
}
