//! Per-kind structural and value rules.
//!
//! Structural checks read the store as accumulated so far, so a record can
//! only reference parents defined on earlier rows, and the first record with
//! an id keeps it.

use crate::config::ValidationConfig;
use crate::diagnostics::{Code, Diagnostics, Location};
use crate::model::{columns, Record, RecordKind, Row};
use crate::store::RecordStore;

/// Extended Date/Time Format check, supplied from outside the engine.
pub trait DateValidator {
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> DateValidator for F
where
    F: Fn(&str) -> bool,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

/// Literal marker the source uses for "no date".
const NOT_APPLICABLE: &str = "N/A";

/// Legacy red flags: (needle, explanation).
const LEGACY_DATE_FLAGS: [(&str, &str); 3] = [
    ("*", "use ~ at the end for approximate"),
    ("|", "date field is not repeatable"),
    ("1909-1910", "use .. between ranges"),
];

fn fault(row: &mut Row, kind: RecordKind, code: Code, diags: &mut Diagnostics, msg: String) {
    match code {
        Code::MissingId | Code::DuplicateId | Code::MissingParent | Code::UnknownParent => {
            row.structural_issue = true
        }
        _ => row.value_issue = true,
    }
    diags.push(code, Location::row(kind, row), msg);
}

/// Identity and parent-linkage checks against the store as it is now.
pub fn validate_structure(record: &mut Record, store: &RecordStore, diags: &mut Diagnostics) {
    let kind = record.kind();
    let row = record.row_mut();
    let id_column = kind.id_column();

    if row.id.is_empty() {
        fault(row, kind, Code::MissingId, diags, format!("{id_column} is missing"));
    } else if kind != RecordKind::View {
        if let Some(first) = store.get(kind, &row.id) {
            let msg = format!(
                "{id_column} [{}] already defined at {}:{}",
                row.id, first.source, first.source_line
            );
            fault(row, kind, Code::DuplicateId, diags, msg);
        }
    }

    let Some(parent_column) = kind.parent_column() else {
        return;
    };
    let parent_kind = match kind {
        RecordKind::Object => RecordKind::Item,
        _ => RecordKind::Object,
    };
    let parent = row.field(parent_column).to_string();
    if parent.is_empty() {
        fault(row, kind, Code::MissingParent, diags, format!("{parent_column} is missing"));
    } else if !store.contains(parent_kind, &parent) {
        let msg = format!("{parent_column} [{parent}] not found on any earlier {parent_kind} row");
        fault(row, kind, Code::UnknownParent, diags, msg);
    } else {
        row.parent_id = Some(parent);
    }
}

/// Field-level rules. Independent of structural faults.
pub fn validate_fields(
    record: &mut Record,
    dates: &dyn DateValidator,
    policy: &ValidationConfig,
    diags: &mut Diagnostics,
) {
    let kind = record.kind();
    let row = record.row_mut();

    if matches!(kind, RecordKind::Object | RecordKind::Item) && row.field(columns::TITLE).is_empty() {
        fault(row, kind, Code::MissingTitle, diags, "TITLE is required".into());
    }

    let redact = row.field(columns::REDACT);
    if !redact.is_empty() {
        let msg = format!("REDACT is set [{redact}]; remove this row from the sheet");
        fault(row, kind, Code::Redacted, diags, msg);
    }

    validate_date(row, kind, dates, policy, diags);
}

fn validate_date(
    row: &mut Row,
    kind: RecordKind,
    dates: &dyn DateValidator,
    policy: &ValidationConfig,
    diags: &mut Diagnostics,
) {
    let original = row.field(columns::DATE).to_string();
    if original.is_empty() {
        return;
    }
    let mut cleared = false;

    if policy.strict_legacy_date_checks {
        for (needle, hint) in LEGACY_DATE_FLAGS {
            if original.contains(needle) {
                let msg = format!("DATE [{original}] not imported: {hint}");
                fault(row, kind, Code::LegacyDate, diags, msg);
                cleared = true;
            }
        }
    }

    if original.contains(NOT_APPLICABLE) {
        diags.push(
            Code::DateNotApplicable,
            Location::row(kind, row),
            format!("DATE [{original}]: 'N/A' is redundant as a date, removing"),
        );
        cleared = true;
    }

    if cleared {
        row.set_field(columns::DATE, "");
        return;
    }

    if !dates.is_valid(&original) {
        let msg = format!("DATE [{original}] is not a valid EDTF date");
        fault(row, kind, Code::InvalidDate, diags, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn record(kind: RecordKind, pairs: &[(&str, &str)]) -> Record {
        let fields: IndexMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Record::new(kind, fields, "t.csv".into(), 2)
    }

    fn year_only(value: &str) -> bool {
        value.len() == 4 && value.chars().all(|c| c.is_ascii_digit())
    }

    fn lenient() -> ValidationConfig {
        ValidationConfig::default()
    }

    fn strict() -> ValidationConfig {
        ValidationConfig {
            strict_legacy_date_checks: true,
            ..ValidationConfig::default()
        }
    }

    fn store_with(records: Vec<Record>) -> RecordStore {
        let mut store = RecordStore::new();
        for r in records {
            store.insert(r);
        }
        store
    }

    #[test]
    fn object_requires_known_item() {
        let store = store_with(vec![record(RecordKind::Item, &[("ITEM", "I-1")])]);
        let mut diags = Diagnostics::new();

        let mut ok = record(RecordKind::Object, &[("OBJECT", "O-1"), ("ITEM", "I-1")]);
        validate_structure(&mut ok, &store, &mut diags);
        assert!(!ok.row().structural_issue);
        assert_eq!(ok.row().parent_id.as_deref(), Some("I-1"));

        let mut orphan = record(RecordKind::Object, &[("OBJECT", "O-2"), ("ITEM", "I-9")]);
        validate_structure(&mut orphan, &store, &mut diags);
        assert!(orphan.row().structural_issue);
        assert!(orphan.row().parent_id.is_none());
        assert_eq!(diags.count(Code::UnknownParent), 1);
    }

    #[test]
    fn duplicate_object_flags_the_new_row_only() {
        let store = store_with(vec![
            record(RecordKind::Item, &[("ITEM", "I-1")]),
            record(RecordKind::Object, &[("OBJECT", "O-1"), ("ITEM", "I-1")]),
        ]);
        let mut diags = Diagnostics::new();
        let mut dup = record(RecordKind::Object, &[("OBJECT", "O-1"), ("ITEM", "I-1")]);
        validate_structure(&mut dup, &store, &mut diags);
        assert!(dup.row().structural_issue);
        assert!(!store.objects["O-1"].structural_issue);
        assert!(diags.entries()[0].message.contains("already defined at t.csv:2"));
    }

    #[test]
    fn missing_ids_are_structural() {
        let store = RecordStore::new();
        let mut diags = Diagnostics::new();
        let mut item = record(RecordKind::Item, &[("TITLE", "x")]);
        validate_structure(&mut item, &store, &mut diags);
        assert!(item.row().structural_issue);
        assert_eq!(diags.count(Code::MissingId), 1);

        let mut view = record(RecordKind::View, &[("FILENAME", "a.jpg"), ("OBJECT", "")]);
        validate_structure(&mut view, &store, &mut diags);
        assert!(view.row().structural_issue);
        assert_eq!(diags.count(Code::MissingParent), 1);
    }

    #[test]
    fn view_links_to_object() {
        let store = store_with(vec![record(RecordKind::Object, &[("OBJECT", "O-1")])]);
        let mut diags = Diagnostics::new();
        let mut view = record(RecordKind::View, &[("FILENAME", "a.jpg"), ("OBJECT", "O-1")]);
        validate_structure(&mut view, &store, &mut diags);
        assert!(!view.row().structural_issue);
        assert_eq!(view.row().parent_id.as_deref(), Some("O-1"));
    }

    #[test]
    fn title_required_for_object_and_item_only() {
        let mut diags = Diagnostics::new();
        let mut item = record(RecordKind::Item, &[("ITEM", "I-1")]);
        validate_fields(&mut item, &year_only, &lenient(), &mut diags);
        assert!(item.row().value_issue);

        let mut view = record(RecordKind::View, &[("FILENAME", "a.jpg")]);
        validate_fields(&mut view, &year_only, &lenient(), &mut diags);
        assert!(!view.row().value_issue);
    }

    #[test]
    fn redact_marks_value_issue_on_any_kind() {
        let mut diags = Diagnostics::new();
        let mut view = record(RecordKind::View, &[("FILENAME", "a.jpg"), ("REDACT", "x")]);
        validate_fields(&mut view, &year_only, &lenient(), &mut diags);
        assert!(view.row().value_issue);
        assert!(!view.row().structural_issue);
        assert_eq!(diags.count(Code::Redacted), 1);
    }

    #[test]
    fn not_applicable_date_is_cleared_with_warning() {
        let mut diags = Diagnostics::new();
        let mut obj = record(RecordKind::Object, &[("OBJECT", "O-1"), ("TITLE", "t"), ("DATE", "N/A")]);
        validate_fields(&mut obj, &year_only, &lenient(), &mut diags);
        assert_eq!(obj.row().field("DATE"), "");
        assert!(!obj.row().value_issue);
        assert_eq!(diags.count(Code::DateNotApplicable), 1);
    }

    #[test]
    fn date_checked_by_validator() {
        let mut diags = Diagnostics::new();
        let mut good = record(RecordKind::Object, &[("OBJECT", "O-1"), ("TITLE", "t"), ("DATE", "2021")]);
        validate_fields(&mut good, &year_only, &lenient(), &mut diags);
        assert!(!good.row().value_issue);

        let mut bad = record(RecordKind::Object, &[("OBJECT", "O-2"), ("TITLE", "t"), ("DATE", "not-a-date")]);
        validate_fields(&mut bad, &year_only, &lenient(), &mut diags);
        assert!(bad.row().value_issue);
        assert_eq!(bad.row().field("DATE"), "not-a-date", "invalid dates are kept for reporting");
    }

    #[test]
    fn legacy_flags_only_when_strict() {
        let accept_all = |_: &str| true;
        let mut diags = Diagnostics::new();

        let mut lax = record(RecordKind::Object, &[("OBJECT", "O-1"), ("TITLE", "t"), ("DATE", "1909-1910")]);
        validate_fields(&mut lax, &accept_all, &lenient(), &mut diags);
        assert!(!lax.row().value_issue);
        assert_eq!(lax.row().field("DATE"), "1909-1910");

        let mut strict_row = record(RecordKind::Object, &[("OBJECT", "O-1"), ("TITLE", "t"), ("DATE", "1909-1910")]);
        validate_fields(&mut strict_row, &accept_all, &strict(), &mut diags);
        assert!(strict_row.row().value_issue);
        assert_eq!(strict_row.row().field("DATE"), "");
        assert_eq!(diags.count(Code::LegacyDate), 1);
    }

    #[test]
    fn legacy_flags_stack() {
        let mut diags = Diagnostics::new();
        let mut obj = record(RecordKind::Object, &[("OBJECT", "O-1"), ("TITLE", "t"), ("DATE", "1950*|1951")]);
        validate_fields(&mut obj, &|_: &str| true, &strict(), &mut diags);
        assert_eq!(diags.count(Code::LegacyDate), 2);
        assert_eq!(diags.count(Code::InvalidDate), 0, "cleared dates are not re-checked");
    }

    #[test]
    fn structural_and_value_faults_are_independent() {
        let store = RecordStore::new();
        let mut diags = Diagnostics::new();
        let mut obj = record(RecordKind::Object, &[("OBJECT", "O-1"), ("ITEM", "missing")]);
        validate_structure(&mut obj, &store, &mut diags);
        validate_fields(&mut obj, &year_only, &lenient(), &mut diags);
        assert!(obj.row().structural_issue);
        assert!(obj.row().value_issue);
    }
}
