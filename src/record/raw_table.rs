use crate::error::SchemaError;

/// The input table exactly as read: two header rows, then data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// First header row. Metric codes for columns beyond the three index columns.
    pub codes: Vec<String>,
    /// Second header row. Human-readable metric names aligned with `codes`.
    pub names: Vec<String>,
    /// Each data row, as a Vec of Strings (one per field).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Split raw records into the two header rows and the data rows.
    pub fn from_records(records: Vec<Vec<String>>) -> Result<Self, SchemaError> {
        if records.len() < 2 {
            return Err(SchemaError::MissingHeaderRows {
                found: records.len(),
            });
        }
        let mut it = records.into_iter();
        let codes = it.next().unwrap_or_default();
        let names = it.next().unwrap_or_default();
        Ok(Self {
            codes,
            names,
            rows: it.collect(),
        })
    }

    /// Number of columns the header declares.
    pub fn width(&self) -> usize {
        self.codes.len()
    }

    /// Field `col` of data row `row`, empty when the row is short.
    pub fn field(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}
