// src/pivot/mod.rs
pub mod table;

pub use table::{GroupBy, PivotRow, PivotedTable, YearColumn, KEY_COLUMNS};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::record::{parse, DetectionSet, EntityKey, Observation};

/// What to do when two rows share (jurisdiction, category, year).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the first present value in input order and log the repeats.
    #[default]
    KeepFirst,
    /// Fail the run on the first repeat.
    Reject,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            DuplicatePolicy::KeepFirst => "keep-first",
            DuplicatePolicy::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep-first" | "first" => Some(DuplicatePolicy::KeepFirst),
            "reject" => Some(DuplicatePolicy::Reject),
            _ => None,
        }
    }
}

/// Reshape the detection set into one row per (jurisdiction, category, metric)
/// and one column per distinct year. This is a reshape, never an aggregation.
#[tracing::instrument(level = "info", skip(set), fields(rows = set.len()))]
pub fn pivot(set: &DetectionSet<'_>, policy: DuplicatePolicy) -> Result<PivotedTable, EngineError> {
    let catalog = set.catalog();

    // rows without any year have no column to land in
    let dated: Vec<&Observation> = set
        .iter()
        .filter(|o| !parse::is_absent(&o.year_raw))
        .collect();
    let undated = set.len() - dated.len();
    if undated > 0 {
        debug!(undated, "rows with an empty year left out of the pivot");
    }

    // 1) year columns: numeric ascending, then unparsed labels in first-seen order
    let mut numeric: BTreeSet<i32> = BTreeSet::new();
    let mut labels: Vec<String> = Vec::new();
    for o in &dated {
        match o.year {
            Some(y) => {
                numeric.insert(y);
            }
            None => {
                let label = o.year_label();
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
    }
    let years: Vec<YearColumn> = numeric
        .into_iter()
        .map(YearColumn::Year)
        .chain(labels.into_iter().map(YearColumn::Label))
        .collect();
    let column_of: HashMap<YearColumn, usize> = years
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();

    // 2) fill cells, first present value wins
    let mut cells: BTreeMap<EntityKey, Vec<Option<String>>> = BTreeMap::new();
    let mut seen_rows: HashSet<(String, String, usize)> = HashSet::new();
    let mut duplicate_rows = 0usize;

    for o in &dated {
        let year_col = match o.year {
            Some(y) => YearColumn::Year(y),
            None => YearColumn::Label(o.year_label()),
        };
        let col = column_of[&year_col];
        let jurisdiction = o.jurisdiction.trim().to_string();
        let category = o.category.as_deref().unwrap_or_default().trim().to_string();

        if !seen_rows.insert((jurisdiction.clone(), category.clone(), col)) {
            if policy == DuplicatePolicy::Reject {
                return Err(EngineError::DuplicateObservation {
                    jurisdiction,
                    category,
                    year: year_col.to_string(),
                });
            }
            duplicate_rows += 1;
            debug!(row = o.row, %jurisdiction, %category, year = %year_col, "duplicate row");
        }

        for (m, def) in catalog.definitions().iter().enumerate() {
            let key = EntityKey {
                jurisdiction: jurisdiction.clone(),
                category: category.clone(),
                metric: def.code.clone(),
            };
            let row = cells.entry(key).or_insert_with(|| vec![None; years.len()]);
            if row[col].is_none() {
                row[col] = o.value(m).map(str::to_string);
            }
        }
    }

    if duplicate_rows > 0 {
        warn!(
            duplicate_rows,
            "rows repeat an earlier (jurisdiction, category, year); first values kept"
        );
    }

    // 3) series with no value in any year are not rows
    let rows: Vec<PivotRow> = cells
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(Option::is_some))
        .map(|(key, cells)| PivotRow { key, cells })
        .collect();
    info!(rows = rows.len(), years = years.len(), "pivot complete");

    Ok(PivotedTable {
        years,
        rows,
        duplicate_rows,
    })
}
