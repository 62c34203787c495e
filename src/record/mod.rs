// src/record/mod.rs
pub mod key;
pub mod metric;
pub mod parse;
pub mod raw_table;
pub mod reader;

pub use key::EntityKey;
pub use metric::{MetricCatalog, MetricDefinition};
pub use parse::Cell;
pub use raw_table::RawTable;

use tracing::{debug, warn};

use crate::error::SchemaError;

/// Fiscal year, jurisdiction, category.
pub const INDEX_COLUMNS: usize = 3;

/// One data row of the input, restricted to what detection needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Zero-based position of the row among the data rows of the source table.
    pub row: usize,
    pub year_raw: String,
    /// `None` when the year field is not a whole number.
    pub year: Option<i32>,
    pub jurisdiction: String,
    /// `None` when the category field is empty or an NA token.
    pub category: Option<String>,
    /// Cleaned metric cells aligned with the catalog; `None` when absent.
    pub values: Vec<Option<String>>,
}

impl Observation {
    pub fn value(&self, metric: usize) -> Option<&str> {
        self.values.get(metric).and_then(|v| v.as_deref())
    }

    pub fn cell(&self, metric: usize) -> Cell<'_> {
        Cell::from_raw(self.value(metric))
    }

    pub fn entity_key(&self, metric_code: &str) -> EntityKey {
        EntityKey::new(
            &self.jurisdiction,
            self.category.as_deref().unwrap_or(""),
            metric_code,
        )
    }

    /// Column label of this row's year in the pivoted table.
    pub fn year_label(&self) -> String {
        match self.year {
            Some(y) => y.to_string(),
            None => parse::clean_str(&self.year_raw).to_string(),
        }
    }
}

/// Every observation of the input plus the metric catalog.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub observations: Vec<Observation>,
    pub catalog: MetricCatalog,
}

impl LoadedTable {
    /// Rows with a category, as a view over `observations`.
    pub fn detection_set(&self) -> DetectionSet<'_> {
        DetectionSet::new(&self.observations, &self.catalog)
    }
}

/// Filtered view of the observations that take part in detection and the pivot.
///
/// Holds indices into the full observation list, never copies of it.
#[derive(Debug, Clone)]
pub struct DetectionSet<'a> {
    observations: &'a [Observation],
    catalog: &'a MetricCatalog,
    members: Vec<usize>,
}

impl<'a> DetectionSet<'a> {
    pub fn new(observations: &'a [Observation], catalog: &'a MetricCatalog) -> Self {
        let members: Vec<usize> = observations
            .iter()
            .enumerate()
            .filter(|(_, o)| o.category.is_some())
            .map(|(i, _)| i)
            .collect();
        let skipped = observations.len() - members.len();
        if skipped > 0 {
            debug!(skipped, "rows without a category left out of detection");
        }
        Self {
            observations,
            catalog,
            members,
        }
    }

    /// Observations in input order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Observation> + '_ {
        let all = self.observations;
        self.members.iter().map(move |&i| &all[i])
    }

    pub fn catalog(&self) -> &'a MetricCatalog {
        self.catalog
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Parse the dual header into a metric catalog and turn each data row into an
/// [`Observation`]. Rows without a category are kept here; [`DetectionSet`]
/// leaves them out.
#[tracing::instrument(level = "info", skip(raw), fields(rows = raw.rows.len()))]
pub fn load_observations(raw: &RawTable) -> Result<LoadedTable, SchemaError> {
    if raw.codes.len() < INDEX_COLUMNS {
        return Err(SchemaError::TooFewColumns {
            found: raw.codes.len(),
        });
    }
    if raw.codes.len() != raw.names.len() {
        return Err(SchemaError::HeaderMismatch {
            codes: raw.codes.len(),
            names: raw.names.len(),
        });
    }

    let catalog = MetricCatalog::from_headers(
        &raw.codes[INDEX_COLUMNS..],
        &raw.names[INDEX_COLUMNS..],
        INDEX_COLUMNS,
    )?;

    let width = raw.width();
    let mut unparsed_years = 0usize;
    let mut observations = Vec::with_capacity(raw.rows.len());
    for (row, fields) in raw.rows.iter().enumerate() {
        if fields.len() > width {
            warn!(
                row,
                fields = fields.len(),
                width,
                "row has more fields than the header; extra fields ignored"
            );
        }

        let year_raw = raw.field(row, 0).to_string();
        let year = parse::parse_year(&year_raw);
        if year.is_none() {
            unparsed_years += 1;
        }

        let category = raw.field(row, 2);
        let category = (!parse::is_absent(category)).then(|| category.to_string());

        let values = (0..catalog.len())
            .map(|m| {
                let cell = raw.field(row, INDEX_COLUMNS + m);
                (!parse::is_absent(cell)).then(|| parse::clean_str(cell).to_string())
            })
            .collect();

        observations.push(Observation {
            row,
            year_raw,
            year,
            jurisdiction: raw.field(row, 1).to_string(),
            category,
            values,
        });
    }

    if unparsed_years > 0 {
        debug!(unparsed_years, "rows with a non-numeric year");
    }
    debug!(
        observations = observations.len(),
        metrics = catalog.len(),
        "loaded observations"
    );

    Ok(LoadedTable {
        observations,
        catalog,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a raw table from string slices: two header rows, then data rows.
    pub(crate) fn raw_table(records: &[&[&str]]) -> RawTable {
        let records = records
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect();
        RawTable::from_records(records).unwrap()
    }

    #[test]
    fn loads_catalog_and_observations() {
        let raw = raw_table(&[
            &["", "", "", "m1", "m2"],
            &["", "", "", "Trips", "Cost"],
            &["2022", " Springfield ", "Transit", "10", "1,200"],
            &["2023.0", "Springfield", "", "11", ""],
            &["FY24", "Shelbyville", "Transit", "abc", "NA"],
        ]);
        let table = load_observations(&raw).unwrap();

        assert_eq!(table.catalog.len(), 2);
        assert_eq!(table.catalog.display_name("m2"), "Cost");
        assert_eq!(table.observations.len(), 3);

        let first = &table.observations[0];
        assert_eq!(first.year, Some(2022));
        assert_eq!(first.value(1), Some("1,200"));
        assert_eq!(first.cell(1), Cell::Number(1200.0));
        assert_eq!(
            first.entity_key("m1"),
            EntityKey::new("Springfield", "Transit", "m1")
        );

        let second = &table.observations[1];
        assert_eq!(second.year, Some(2023));
        assert_eq!(second.category, None);
        assert_eq!(second.value(1), None);

        let third = &table.observations[2];
        assert_eq!(third.year, None);
        assert_eq!(third.year_label(), "FY24");
        assert_eq!(third.cell(0), Cell::Text("abc"));
        assert_eq!(third.value(1), None);
    }

    #[test]
    fn detection_set_is_a_view_without_empty_categories() {
        let raw = raw_table(&[
            &["", "", "", "m1"],
            &["", "", "", "Trips"],
            &["2022", "A", "Transit", "1"],
            &["2022", "A", " ", "2"],
            &["2023", "B", "Parks", "3"],
        ]);
        let table = load_observations(&raw).unwrap();
        let set = table.detection_set();
        assert_eq!(set.len(), 2);
        let rows: Vec<usize> = set.iter().map(|o| o.row).collect();
        assert_eq!(rows, vec![0, 2]);
        // the full observation set still carries the row without category
        assert_eq!(table.observations.len(), 3);
    }

    #[test]
    fn short_rows_are_padded_as_absent() {
        let raw = raw_table(&[
            &["", "", "", "m1", "m2"],
            &["", "", "", "a", "b"],
            &["2022", "A", "Transit", "1"],
        ]);
        let table = load_observations(&raw).unwrap();
        assert_eq!(table.observations[0].value(1), None);
    }

    #[test]
    fn schema_errors() {
        let too_narrow = raw_table(&[&["", ""], &["", ""]]);
        assert_eq!(
            load_observations(&too_narrow).unwrap_err(),
            SchemaError::TooFewColumns { found: 2 }
        );

        let misaligned = raw_table(&[&["", "", "", "m1"], &["", "", ""]]);
        assert_eq!(
            load_observations(&misaligned).unwrap_err(),
            SchemaError::HeaderMismatch { codes: 4, names: 3 }
        );
    }
}
