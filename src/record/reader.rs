use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::debug;

use super::RawTable;

/// Read a two-header-row CSV file into a [`RawTable`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_raw_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open input CSV: {:?}", path.as_ref()))?;
    read_raw_table_from(BufReader::new(file))
        .with_context(|| format!("Failed to read input CSV: {:?}", path.as_ref()))
}

/// Same as [`read_raw_table`] for any reader.
pub fn read_raw_table_from<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // short and long rows are reconciled by the record model
        .from_reader(reader);

    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        if idx == 0 {
            if let Some(first) = fields.first_mut() {
                if let Some(stripped) = first.strip_prefix('\u{feff}') {
                    *first = stripped.to_string();
                }
            }
        }
        records.push(fields);
    }
    debug!(records = records.len(), "read CSV records");

    Ok(RawTable::from_records(records)?)
}
