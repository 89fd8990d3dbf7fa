use indexmap::IndexMap;

use crate::analysis::analyze;
use crate::catalog::CatalogIndex;
use crate::config::{IndexKind, ReconConfig};
use crate::diagnostics::{Code, Diagnostics, Location};
use crate::error::ReconError;
use crate::model::{columns, RawRow, ReconInput, ReconMeta, ReconResult, Record, RecordKind};
use crate::names::extract_names;
use crate::normalize::normalize_fields;
use crate::resolve::{resolve_file, resolve_record, FileListing};
use crate::store::RecordStore;
use crate::validate::{validate_fields, validate_structure, DateValidator};

/// Boundary inputs resolved before the scan starts.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub catalog: &'a CatalogIndex,
    pub dates: &'a dyn DateValidator,
    /// Payload directory listing; `None` skips file resolution.
    pub files: Option<&'a FileListing>,
}

/// One ingestion run. Owns the store and the diagnostics for its lifetime.
pub struct Ingest<'a> {
    config: &'a ReconConfig,
    collab: Collaborators<'a>,
    store: RecordStore,
    diags: Diagnostics,
}

impl<'a> Ingest<'a> {
    pub fn new(config: &'a ReconConfig, collab: Collaborators<'a>) -> Self {
        Self {
            config,
            collab,
            store: RecordStore::new(),
            diags: Diagnostics::new(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    /// Process one row against the store as it is now. Returns the kind the
    /// row was classified as, or `None` if it was skipped.
    pub fn ingest(&mut self, raw: &RawRow) -> Option<RecordKind> {
        let config = self.config;
        let fields = normalize_fields(&raw.fields, &config.validation.assumed_extension);
        if fields.values().all(String::is_empty) {
            return None;
        }

        let location = Location::line(&raw.source, raw.line);
        extract_names(
            &fields,
            &config.names.fields,
            &mut self.store.names,
            &location,
            &mut self.diags,
        );

        let type_value = fields.get(columns::TYPE).map(String::as_str).unwrap_or("");
        let Some(kind) = RecordKind::from_type_field(type_value) else {
            self.diags.push(
                Code::UnknownType,
                location,
                format!("TYPE [{type_value}] not recognized; row skipped"),
            );
            return None;
        };

        let mut record = Record::new(kind, fields, raw.source.clone(), raw.line);
        validate_structure(&mut record, &self.store, &mut self.diags);
        validate_fields(&mut record, self.collab.dates, &config.validation, &mut self.diags);

        if let Record::View(ref mut view) = record {
            if config.validation.drop_invalid_views_early && view.row.is_faulted() {
                self.store.discarded_views += 1;
                self.diags.push(
                    Code::ViewDiscarded,
                    Location::row(kind, &view.row),
                    "view failed validation; discarded before resolution",
                );
                return Some(kind);
            }
            if let Some(files) = self.collab.files {
                resolve_file(view, files, &mut self.diags);
            }
            if !view.row.id.is_empty() {
                if let Some(first) = self.store.views.get(&view.row.id) {
                    let msg = format!(
                        "FILENAME [{}] already defined at {}:{}",
                        view.row.id, first.row.source, first.row.source_line
                    );
                    view.row.structural_issue = true;
                    self.diags.push(Code::DuplicateId, Location::row(kind, &view.row), msg);
                }
            }
        }

        resolve_record(&mut record, self.collab.catalog);

        let row = record.row();
        tracing::debug!(
            kind = %kind,
            id = %row.id,
            line = row.source_line,
            faulted = row.is_faulted(),
            cataloged = row.catalog_id.is_some(),
            "ingested row"
        );
        self.store.insert(record);
        Some(kind)
    }

    pub fn finish(mut self) -> ReconResult {
        self.store
            .names
            .resolve(self.collab.catalog.completed(IndexKind::Name));
        let analysis = analyze(&self.store);

        ReconResult {
            meta: ReconMeta {
                config_name: self.config.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                strict_legacy_date_checks: self.config.validation.strict_legacy_date_checks,
                drop_invalid_views_early: self.config.validation.drop_invalid_views_early,
            },
            analysis,
            store: self.store,
            diagnostics: self.diags.into_vec(),
        }
    }
}

/// Run a full scan over `input` in order.
pub fn run(config: &ReconConfig, input: &ReconInput, collab: Collaborators<'_>) -> ReconResult {
    let mut ingest = Ingest::new(config, collab);
    for raw in &input.rows {
        ingest.ingest(raw);
    }
    ingest.finish()
}

/// Load one CSV row source. Header cells are trimmed; a leading UTF-8 BOM is
/// ignored. Short rows read missing cells as empty.
pub fn load_csv_rows(source_name: &str, csv_data: &str) -> Result<Vec<RawRow>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(format!("{source_name}: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if !headers.iter().any(|h| h == columns::TYPE) {
        return Err(ReconError::MissingColumn {
            source_name: source_name.into(),
            column: columns::TYPE.into(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(format!("{source_name}: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut fields = IndexMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            fields.insert(h.clone(), record.get(i).unwrap_or("").to_string());
        }

        rows.push(RawRow {
            source: source_name.to_string(),
            line,
            fields,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IndexEntry;
    use crate::model::CatalogId;

    fn year_only(value: &str) -> bool {
        value.len() == 4 && value.chars().all(|c| c.is_ascii_digit())
    }

    fn config(toml: &str) -> ReconConfig {
        ReconConfig::from_toml(toml).unwrap()
    }

    fn run_csv(config: &ReconConfig, csv: &str, catalog: &CatalogIndex, files: Option<&FileListing>) -> ReconResult {
        let rows = load_csv_rows("sheet.csv", csv).unwrap();
        let input = ReconInput { rows };
        run(
            config,
            &input,
            Collaborators {
                catalog,
                dates: &year_only,
                files,
            },
        )
    }

    #[test]
    fn load_csv_basic() {
        let csv = "\u{feff}TYPE , ITEM,TITLE\nitem,I-1,Box 1\nitem,I-2\n";
        let rows = load_csv_rows("sheet.csv", csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].get("TYPE"), "item");
        assert_eq!(rows[0].get("ITEM"), "I-1");
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].get("TITLE"), "", "short rows pad with empty cells");
    }

    #[test]
    fn load_csv_requires_type_column() {
        let err = load_csv_rows("bad.csv", "ITEM,TITLE\nI-1,x\n").unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "TYPE"));
    }

    #[test]
    fn hierarchy_in_order() {
        let csv = "\
TYPE,ITEM,OBJECT,FILENAME,TITLE,DATE
Item,I-1,,,Box 1,
Object,I-1,O-1,,Letter,1921
View,,O-1,scan_0001,,
";
        let cfg = config("name = \"t\"");
        let result = run_csv(&cfg, csv, &CatalogIndex::empty(), None);
        let store = &result.store;
        assert_eq!(store.items.len(), 1);
        assert_eq!(store.objects.len(), 1);
        assert_eq!(store.views.len(), 1);
        assert!(store.views.contains_key("scan_0001.jpg"));
        assert!(!store.objects["O-1"].is_faulted());
        assert_eq!(store.views["scan_0001.jpg"].row.parent_id.as_deref(), Some("O-1"));
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unknown_type_is_skipped_but_names_harvested() {
        let csv = "\
TYPE,ITEM,CREATOR
collection,C-1,\"Doe, A\"
";
        let cfg = config(
            r#"
name = "t"
[names]
fields = ["CREATOR"]
"#,
        );
        let result = run_csv(&cfg, csv, &CatalogIndex::empty(), None);
        assert!(result.store.items.is_empty());
        assert!(result.store.names.get("Doe, A").is_some());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, Code::UnknownType);
    }

    #[test]
    fn blank_rows_are_skipped_silently() {
        let csv = "TYPE,ITEM,TITLE\n,,\nitem,I-1,x\n";
        let result = run_csv(&config("name = \"t\""), csv, &CatalogIndex::empty(), None);
        assert_eq!(result.store.items.len(), 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn faulted_view_kept_by_default() {
        let csv = "\
TYPE,OBJECT,FILENAME,REDACT
View,O-404,photo.jpg,yes
";
        let files = FileListing::new(["photo.jpg"]);
        let result = run_csv(&config("name = \"t\""), csv, &CatalogIndex::empty(), Some(&files));
        let view = &result.store.views["photo.jpg"];
        assert!(view.row.structural_issue);
        assert!(view.row.value_issue);
        assert!(view.has_file, "resolution still runs");
        assert_eq!(result.analysis.discarded_views, 0);
    }

    #[test]
    fn faulted_view_dropped_early_when_configured() {
        let csv = "\
TYPE,OBJECT,FILENAME
View,O-404,photo.jpg
";
        let cfg = config(
            r#"
name = "t"
[validation]
drop_invalid_views_early = true
"#,
        );
        let files = FileListing::new(["photo.jpg"]);
        let result = run_csv(&cfg, csv, &CatalogIndex::empty(), Some(&files));
        assert!(result.store.views.is_empty());
        assert!(result.store.rejected.is_empty());
        assert_eq!(result.analysis.discarded_views, 1);
        assert!(result.diagnostics.iter().any(|d| d.code == Code::ViewDiscarded));
    }

    #[test]
    fn duplicate_view_after_rename_is_rejected() {
        let csv = "\
TYPE,ITEM,OBJECT,FILENAME,TITLE
Item,I-1,,,Box
Object,I-1,O-1,,Letter
View,,O-1,scan.tif,
View,,O-1,scan,
";
        let files = FileListing::new(["scan.tif"]);
        let result = run_csv(&config("name = \"t\""), csv, &CatalogIndex::empty(), Some(&files));
        assert_eq!(result.store.views.len(), 1);
        assert_eq!(result.store.rejected.len(), 1);
        assert!(result.store.rejected[0].row().structural_issue);
        assert!(result.diagnostics.iter().any(|d| d.code == Code::DuplicateId));
    }

    #[test]
    fn ready_count_matches_ready_export() {
        let csv = "\
TYPE,ITEM,OBJECT,FILENAME,TITLE,REDACT
Item,I-1,,,Box,
Object,I-1,O-1,,Withheld letter,yes
View,,O-1,a.jpg,,
Object,I-1,O-2,,Letter,
View,,O-2,b.jpg,,
";
        let cfg = config(
            r#"
name = "t"
[[exports]]
name = "ready"
kind = "object"
select = "ready"
file = "ready.csv"
[exports.columns]
identifier = "@id"
"#,
        );
        let files = FileListing::new(["a.jpg", "b.jpg"]);
        let result = run_csv(&cfg, csv, &CatalogIndex::empty(), Some(&files));
        assert!(result.store.views["a.jpg"].has_file);

        let table = crate::export::export_records(&cfg.exports[0], &result.store);
        assert_eq!(table.rows, vec![vec!["O-2".to_string()]]);
        assert_eq!(result.analysis.ready_objects, ["O-2"]);
        assert_eq!(result.analysis.ready_total(), table.len());
    }

    #[test]
    fn padded_catalog_key_still_matches() {
        let source = crate::config::IndexSource {
            path: Some("objects.csv".into()),
            url: None,
            key_field: "key".into(),
            id_field: "id".into(),
            draft_field: "draft".into(),
        };
        let entries =
            crate::catalog::load_csv_entries(IndexKind::Object, "key,id\n O-1 ,11\n", &source).unwrap();
        let mut b = CatalogIndex::builder();
        b.add_entries(IndexKind::Object, entries).unwrap();
        let catalog = b.build();

        let csv = "TYPE,ITEM,OBJECT,TITLE\nItem,I-1,,Box\nObject,I-1,O-1,Letter\n";
        let result = run_csv(&config("name = \"t\""), csv, &catalog, None);
        assert_eq!(result.store.objects["O-1"].catalog_id, Some(CatalogId::from("11")));
        assert_eq!(result.analysis.objects.existing, 1);
    }

    #[test]
    fn catalog_classification_flows_into_analysis() {
        let csv = "\
TYPE,ITEM,OBJECT,TITLE
Item,I-1,,Box
Object,I-1,O-1,A
Object,I-1,O-2,B
Object,I-1,O-3,C
";
        let mut b = CatalogIndex::builder();
        b.add_entries(IndexKind::Item, [IndexEntry::completed("I-1", "10")])
            .unwrap()
            .add_entries(
                IndexKind::Object,
                [IndexEntry::completed("O-1", "11"), IndexEntry::draft("O-2", "12")],
            )
            .unwrap();
        let catalog = b.build();
        let result = run_csv(&config("name = \"t\""), csv, &catalog, None);

        let o2 = &result.store.objects["O-2"];
        assert!(o2.is_draft);
        assert_eq!(o2.parent_catalog_id, Some(CatalogId::from("10")));
        assert_eq!(result.analysis.objects.existing, 1);
        assert_eq!(result.analysis.objects.drafts, 1);
        assert_eq!(result.analysis.objects.new, 1);
        assert_eq!(result.analysis.items.existing, 1);
    }

    #[test]
    fn incremental_ingest_exposes_store() {
        let cfg = config("name = \"t\"");
        let catalog = CatalogIndex::empty();
        let mut ingest = Ingest::new(
            &cfg,
            Collaborators {
                catalog: &catalog,
                dates: &year_only,
                files: None,
            },
        );
        let rows = load_csv_rows("s.csv", "TYPE,ITEM,TITLE\nitem,I-1,x\nitem,I-1,y\n").unwrap();
        assert_eq!(ingest.ingest(&rows[0]), Some(RecordKind::Item));
        assert!(ingest.store().contains(RecordKind::Item, "I-1"));
        ingest.ingest(&rows[1]);
        assert_eq!(ingest.diagnostics().count(Code::DuplicateId), 1);
        let result = ingest.finish();
        assert_eq!(result.store.items["I-1"].field("TITLE"), "x");
    }
}
