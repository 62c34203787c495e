// src/report/mod.rs
//! Maps classification results back onto the original layout and the
//! pivoted layout, and builds the events summary. Everything here is
//! presentation: the engine never depends on it.

pub mod hint;
pub mod notes;
pub mod sheet;
pub mod write;

pub use hint::PresentationHint;
pub use sheet::{CellAnnotation, Sheet, SheetNamer, MAX_SHEET_NAME};
pub use write::{write_report, ReportFiles};

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::detect::DetectConfig;
use crate::events::{ClassificationEvent, EventCounts, EventIndex};
use crate::pivot::{GroupBy, PivotRow, PivotedTable, KEY_COLUMNS};
use crate::record::{Cell, LoadedTable, MetricDefinition, RawTable, INDEX_COLUMNS};

pub const DATA_SHEET: &str = "Data";
pub const TRANSFORMED_SHEET: &str = "Transformed Data";
pub const SUMMARY_SHEET: &str = "Events Summary";
pub const SUMMARY_COLUMNS: [&str; 5] = ["Jurisdiction", "Category", "Metric", "Type", "Value"];

/// One line of the events summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub jurisdiction: String,
    pub category: String,
    /// `code - name`.
    pub metric: String,
    pub event_type: String,
    pub value: String,
    pub note: String,
}

/// Everything a renderer needs, independent of any file format.
#[derive(Debug, Clone)]
pub struct Report {
    pub target_year: i32,
    pub threshold: f64,
    pub metrics: Vec<MetricDefinition>,
    pub data: Sheet,
    pub transformed: Vec<Sheet>,
    pub summary: Vec<SummaryRow>,
    pub events: Vec<ClassificationEvent>,
    pub counts: EventCounts,
}

/// Binds the engine output to the raw layout and the pivoted layout through
/// the shared entity key.
pub struct ReportBinder<'a> {
    raw: &'a RawTable,
    table: &'a LoadedTable,
    pivoted: &'a PivotedTable,
    events: &'a EventIndex,
    config: DetectConfig,
    split_by: Option<GroupBy>,
}

impl<'a> ReportBinder<'a> {
    pub fn new(
        raw: &'a RawTable,
        table: &'a LoadedTable,
        pivoted: &'a PivotedTable,
        events: &'a EventIndex,
        config: DetectConfig,
    ) -> Self {
        Self {
            raw,
            table,
            pivoted,
            events,
            config,
            split_by: None,
        }
    }

    /// Partition the transformed output into one sheet per group.
    pub fn split_by(mut self, group: Option<GroupBy>) -> Self {
        self.split_by = group;
        self
    }

    pub fn bind(&self) -> Report {
        let report = Report {
            target_year: self.config.target_year(),
            threshold: self.config.threshold(),
            metrics: self.table.catalog.definitions().to_vec(),
            data: self.data_sheet(),
            transformed: self.transformed_sheets(),
            summary: self.summary(),
            events: self.events.events().to_vec(),
            counts: self.events.counts(),
        };
        debug!(
            sheets = report.transformed.len(),
            summary_rows = report.summary.len(),
            "report bound"
        );
        report
    }

    /// The input as read, with the dual header restored from the catalog and
    /// events placed on their source cells.
    fn data_sheet(&self) -> Sheet {
        let catalog = &self.table.catalog;
        let width = self.raw.width();

        let codes = self.raw.codes.clone();
        let names: Vec<String> = (0..width)
            .map(|col| {
                col.checked_sub(INDEX_COLUMNS)
                    .and_then(|m| catalog.get(m))
                    .map(|d| d.display_name.clone())
                    .unwrap_or_default()
            })
            .collect();

        let rows: Vec<Vec<String>> = (0..self.raw.rows.len())
            .map(|r| {
                (0..width)
                    .map(|c| self.raw.field(r, c).to_string())
                    .collect()
            })
            .collect();

        let mut annotations = Vec::new();
        let mut flagged: HashSet<(usize, usize)> = HashSet::new();
        for e in self.events.iter() {
            let Some(m) = catalog.index_of(&e.key().metric) else {
                continue;
            };
            let column = INDEX_COLUMNS + m;
            if flagged.insert((e.row(), column)) {
                annotations.push(CellAnnotation::new(
                    e.row(),
                    column,
                    e.kind().into(),
                    Some(notes::event_note(e, catalog)),
                ));
            }
        }

        // target-year numeric cells of rows with a category and no event
        let target = self.config.target_year();
        for o in self.table.detection_set().iter() {
            if o.year != Some(target) {
                continue;
            }
            for m in 0..catalog.len() {
                let column = INDEX_COLUMNS + m;
                if flagged.contains(&(o.row, column)) {
                    continue;
                }
                if let Cell::Number(_) = o.cell(m) {
                    annotations.push(CellAnnotation::new(
                        o.row,
                        column,
                        PresentationHint::Valid,
                        None,
                    ));
                }
            }
        }
        annotations.sort_by_key(|a| (a.row, a.column));

        Sheet {
            name: DATA_SHEET.to_string(),
            header: vec![codes, names],
            rows,
            annotations,
        }
    }

    /// The pivoted table as one sheet, or one sheet per group.
    fn transformed_sheets(&self) -> Vec<Sheet> {
        let mut namer = SheetNamer::with_reserved([DATA_SHEET, SUMMARY_SHEET]);
        match self.split_by {
            None => vec![self.pivot_sheet(namer.name(TRANSFORMED_SHEET), self.pivoted)],
            Some(group) => partition(self.pivoted, group)
                .into_iter()
                .map(|(label, part)| self.pivot_sheet(namer.name(&label), &part))
                .collect(),
        }
    }

    fn pivot_sheet(&self, name: String, table: &PivotedTable) -> Sheet {
        let rows: Vec<Vec<String>> = table.rows.iter().map(pivot_row_fields).collect();

        let mut annotations = Vec::new();
        if let Some(year_col) = table.year_index(self.config.target_year()) {
            let column = KEY_COLUMNS.len() + year_col;
            for (r, row) in table.rows.iter().enumerate() {
                if let Some(e) = self.events.get(&row.key) {
                    annotations.push(CellAnnotation::new(
                        r,
                        column,
                        e.kind().into(),
                        Some(notes::event_note(e, &self.table.catalog)),
                    ));
                } else if Cell::from_raw(row.cells[year_col].as_deref()).is_number() {
                    annotations.push(CellAnnotation::new(r, column, PresentationHint::Valid, None));
                }
            }
        }

        Sheet {
            name,
            header: vec![table.column_labels()],
            rows,
            annotations,
        }
    }

    fn summary(&self) -> Vec<SummaryRow> {
        let catalog = &self.table.catalog;
        self.events
            .iter()
            .map(|e| SummaryRow {
                jurisdiction: e.key().jurisdiction.clone(),
                category: e.key().category.clone(),
                metric: catalog.label(&e.key().metric),
                event_type: e.kind().as_str().to_string(),
                value: notes::summary_value(e),
                note: notes::event_note(e, catalog),
            })
            .collect()
    }
}

/// Split the pivoted table by a key column, groups in ascending label order.
pub fn partition(table: &PivotedTable, group: GroupBy) -> BTreeMap<String, PivotedTable> {
    let mut groups: BTreeMap<String, Vec<PivotRow>> = BTreeMap::new();
    for row in &table.rows {
        groups
            .entry(group.value(&row.key).to_string())
            .or_default()
            .push(row.clone());
    }
    groups
        .into_iter()
        .map(|(label, rows)| (label, table.with_rows(rows)))
        .collect()
}

fn pivot_row_fields(row: &PivotRow) -> Vec<String> {
    [
        row.key.jurisdiction.clone(),
        row.key.category.clone(),
        row.key.metric.clone(),
    ]
    .into_iter()
    .chain(row.cells.iter().map(|c| c.clone().unwrap_or_default()))
    .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detect::classify;
    use crate::events::aggregate;
    use crate::pivot::{pivot, DuplicatePolicy};
    use crate::record::{load_observations, tests::raw_table, EntityKey};

    pub(crate) struct Fixture {
        pub raw: RawTable,
        pub table: LoadedTable,
        pub pivoted: PivotedTable,
        pub events: EventIndex,
        pub config: DetectConfig,
    }

    pub(crate) fn fixture() -> Fixture {
        let raw = raw_table(&[
            &["a_fiscal_year", "a_jurisdiction", "a_service", "m1", "m2"],
            &["", "", "", "Trips", "Cost"],
            &["2021", "Springfield", "Transit", "10", "5"],
            &["2022", "Springfield", "Transit", "20", "5"],
            &["2023", "Springfield", "Transit", "30", "5"],
            &["2024", " Springfield ", "Transit", "40", "5"],
            &["2023", "Albany", "Parks", "1", "abc"],
            &["2024", "Albany", "Parks", "", "zzz"],
            &["2024", "Albany", "", "77", "77"],
        ]);
        let table = load_observations(&raw).unwrap();
        let config = DetectConfig::new(1.0, 2024).unwrap();
        let set = table.detection_set();
        let events = aggregate(classify(&set, &config).unwrap(), 2024);
        let pivoted = pivot(&set, DuplicatePolicy::KeepFirst).unwrap();
        Fixture {
            raw,
            table,
            pivoted,
            events,
            config,
        }
    }

    fn bind(f: &Fixture, split: Option<GroupBy>) -> Report {
        ReportBinder::new(&f.raw, &f.table, &f.pivoted, &f.events, f.config)
            .split_by(split)
            .bind()
    }

    #[test]
    fn summary_is_sorted_by_jurisdiction() {
        let f = fixture();
        let report = bind(&f, None);
        let rows: Vec<(&str, &str, &str, &str)> = report
            .summary
            .iter()
            .map(|r| {
                (
                    r.jurisdiction.as_str(),
                    r.metric.as_str(),
                    r.event_type.as_str(),
                    r.value.as_str(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Albany", "m1 - Trips", "Missing", "N/A"),
                ("Albany", "m2 - Cost", "Non-Numeric", "zzz"),
                ("Springfield", "m1 - Trips", "Anomaly", "40"),
            ]
        );
        assert_eq!(report.counts.total(), 3);
    }

    #[test]
    fn data_sheet_restores_header_and_marks_cells() {
        let f = fixture();
        let data = bind(&f, None).data;
        assert_eq!(data.header[0][3], "m1");
        assert_eq!(data.header[1], vec!["", "", "", "Trips", "Cost"]);
        assert_eq!(data.rows.len(), 7);

        // anomaly on row 3, column m1
        let a = data.annotation_at(3, 3).unwrap();
        assert_eq!(a.hint, PresentationHint::Anomaly);
        assert_eq!(a.fill, "FFAAAA");
        assert!(a.note.as_deref().unwrap().contains("Z-Score"));
        // flat m2 history, value unchanged
        assert_eq!(data.annotation_at(3, 4).unwrap().hint, PresentationHint::Valid);
        assert_eq!(data.annotation_at(5, 3).unwrap().hint, PresentationHint::Missing);
        assert_eq!(data.annotation_at(5, 4).unwrap().hint, PresentationHint::NonNumeric);
        // row without category is never painted
        assert!(data.annotation_at(6, 3).is_none());
        // history years are not painted
        assert!(data.annotation_at(0, 3).is_none());
    }

    #[test]
    fn transformed_sheet_marks_target_year_column_via_key() {
        let f = fixture();
        let report = bind(&f, None);
        assert_eq!(report.transformed.len(), 1);
        let sheet = &report.transformed[0];
        assert_eq!(sheet.name, TRANSFORMED_SHEET);
        assert_eq!(
            sheet.header[0],
            vec!["Jurisdiction", "Category", "Metric", "2021", "2022", "2023", "2024"]
        );

        let row_of = |key: EntityKey| f.pivoted.rows.iter().position(|r| r.key == key).unwrap();
        let target_col = 3 + 3;
        let springfield_m1 = row_of(EntityKey::new("Springfield", "Transit", "m1"));
        assert_eq!(
            sheet.annotation_at(springfield_m1, target_col).unwrap().hint,
            PresentationHint::Anomaly
        );
        let albany_m2 = row_of(EntityKey::new("Albany", "Parks", "m2"));
        assert_eq!(
            sheet.annotation_at(albany_m2, target_col).unwrap().hint,
            PresentationHint::NonNumeric
        );
        let springfield_m2 = row_of(EntityKey::new("Springfield", "Transit", "m2"));
        assert_eq!(
            sheet.annotation_at(springfield_m2, target_col).unwrap().hint,
            PresentationHint::Valid
        );
        assert!(sheet.annotations.iter().all(|a| a.column == target_col));
    }

    #[test]
    fn split_by_jurisdiction_makes_one_sheet_per_group() {
        let f = fixture();
        let report = bind(&f, Some(GroupBy::Jurisdiction));
        let names: Vec<&str> = report.transformed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Albany", "Springfield"]);
        for sheet in &report.transformed {
            assert!(sheet.rows.iter().all(|r| r[0] == sheet.name));
        }
        // annotations refer to rows of their own sheet
        let springfield = &report.transformed[1];
        let a = springfield
            .annotations
            .iter()
            .find(|a| a.hint == PresentationHint::Anomaly)
            .unwrap();
        assert_eq!(springfield.rows[a.row][2], "m1");
    }

    #[test]
    fn partition_by_category() {
        let f = fixture();
        let parts = partition(&f.pivoted, GroupBy::Category);
        assert_eq!(parts.keys().collect::<Vec<_>>(), vec!["Parks", "Transit"]);
        assert_eq!(parts["Transit"].len(), 2);
        assert_eq!(parts["Transit"].years, f.pivoted.years);
    }
}
