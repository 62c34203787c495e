use std::fmt;

use crate::record::EntityKey;

/// Leading key columns of every pivoted table.
pub const KEY_COLUMNS: [&str; 3] = ["Jurisdiction", "Category", "Metric"];

/// A year column of the pivoted table.
///
/// Whole-number years come first in ascending order; rows whose year field
/// holds non-numeric text still get a column, labelled with that text, after
/// them. Rows with an empty year are not pivoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum YearColumn {
    Year(i32),
    Label(String),
}

impl fmt::Display for YearColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearColumn::Year(y) => write!(f, "{}", y),
            YearColumn::Label(s) => f.write_str(s),
        }
    }
}

/// Which key column partitions the table into groups downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupBy {
    Jurisdiction,
    Category,
}

impl GroupBy {
    pub fn as_str(&self) -> &str {
        match self {
            GroupBy::Jurisdiction => "jurisdiction",
            GroupBy::Category => "category",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "jurisdiction" | "municipality" => Some(GroupBy::Jurisdiction),
            "category" => Some(GroupBy::Category),
            _ => None,
        }
    }

    /// The grouping value of a row.
    pub fn value<'k>(&self, key: &'k EntityKey) -> &'k str {
        match self {
            GroupBy::Jurisdiction => &key.jurisdiction,
            GroupBy::Category => &key.category,
        }
    }
}

/// One (jurisdiction, category, metric) series with one cell per year column.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub key: EntityKey,
    /// Aligned with [`PivotedTable::years`]; `None` when nothing was recorded.
    pub cells: Vec<Option<String>>,
}

/// Row-per-entity, column-per-year view of the detection set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotedTable {
    pub years: Vec<YearColumn>,
    /// Sorted by key.
    pub rows: Vec<PivotRow>,
    /// Rows of the input that repeated an earlier (jurisdiction, category, year).
    pub duplicate_rows: usize,
}

impl PivotedTable {
    /// Key columns followed by the year labels.
    pub fn column_labels(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(self.years.iter().map(ToString::to_string))
            .collect()
    }

    /// Position of `year` among the year columns.
    pub fn year_index(&self, year: i32) -> Option<usize> {
        self.years.iter().position(|c| *c == YearColumn::Year(year))
    }

    pub fn row(&self, key: &EntityKey) -> Option<&PivotRow> {
        self.rows
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Value recorded for `key` in `year`.
    pub fn get(&self, key: &EntityKey, year: i32) -> Option<&str> {
        let col = self.year_index(year)?;
        self.row(key)?.cells.get(col)?.as_deref()
    }

    /// Copy of this table keeping only `rows`, with the same year columns.
    pub fn with_rows(&self, rows: Vec<PivotRow>) -> Self {
        Self {
            years: self.years.clone(),
            rows,
            duplicate_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
