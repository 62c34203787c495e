// src/report/write.rs
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Utc};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use super::{Report, Sheet, SummaryRow, SUMMARY_COLUMNS};
use crate::events::{ClassificationEvent, EventCounts};
use crate::record::MetricDefinition;

pub const DATA_FILE: &str = "data.csv";
pub const SUMMARY_CSV: &str = "events_summary.csv";
pub const ANNOTATIONS_FILE: &str = "annotations.json";
pub const SUMMARY_JSON: &str = "summary.json";
pub const TRANSFORMED_DIR: &str = "transformed";

/// Paths of everything [`write_report`] produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportFiles {
    pub data: PathBuf,
    pub transformed_csv: Vec<PathBuf>,
    pub transformed_parquet: Vec<PathBuf>,
    pub events_summary: PathBuf,
    pub annotations: PathBuf,
    pub summary: PathBuf,
}

#[derive(Serialize)]
struct AnnotationsFile<'a> {
    sheets: Vec<&'a Sheet>,
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    generated_at: DateTime<Utc>,
    threshold: f64,
    target_year: i32,
    counts: EventCounts,
    metrics: &'a [MetricDefinition],
    events: &'a [ClassificationEvent],
}

/// Write every sheet of `report` under `out_dir`.
#[tracing::instrument(level = "info", skip(report, out_dir), fields(out_dir = %out_dir.as_ref().display()))]
pub fn write_report<P: AsRef<Path>>(report: &Report, out_dir: P) -> Result<ReportFiles> {
    let out_dir = out_dir.as_ref();
    let transformed_dir = out_dir.join(TRANSFORMED_DIR);
    fs::create_dir_all(&transformed_dir)
        .with_context(|| format!("creating output directory {:?}", transformed_dir))?;

    // 1) original layout
    let data = out_dir.join(DATA_FILE);
    write_sheet_csv(&report.data, &data)?;

    // 2) pivoted layout, one CSV + one Parquet file per sheet
    let mut files = ReportFiles {
        data,
        ..Default::default()
    };
    for sheet in &report.transformed {
        let csv_path = transformed_dir.join(format!("{}.csv", sheet.name));
        write_sheet_csv(sheet, &csv_path)?;
        files.transformed_csv.push(csv_path);

        let parquet_path = transformed_dir.join(format!("{}.parquet", sheet.name));
        write_sheet_parquet(sheet, &parquet_path)?;
        files.transformed_parquet.push(parquet_path);
    }

    // 3) events summary
    files.events_summary = out_dir.join(SUMMARY_CSV);
    write_summary_csv(&report.summary, &files.events_summary)?;

    // 4) styling instructions for every sheet
    files.annotations = out_dir.join(ANNOTATIONS_FILE);
    let sheets = AnnotationsFile {
        sheets: std::iter::once(&report.data)
            .chain(report.transformed.iter())
            .collect(),
    };
    write_json(&sheets, &files.annotations)?;

    // 5) machine-readable run summary
    files.summary = out_dir.join(SUMMARY_JSON);
    let summary = SummaryFile {
        generated_at: Utc::now(),
        threshold: report.threshold,
        target_year: report.target_year,
        counts: report.counts,
        metrics: &report.metrics,
        events: &report.events,
    };
    write_json(&summary, &files.summary)?;

    info!(
        sheets = report.transformed.len(),
        events = report.counts.total(),
        "report written"
    );
    Ok(files)
}

/// Header rows then body rows, as CSV.
pub fn write_sheet_csv(sheet: &Sheet, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
        for record in sheet.header.iter().chain(sheet.rows.iter()) {
            wtr.write_record(record)
                .with_context(|| format!("writing CSV record to {:?}", path))?;
        }
        wtr.flush()?;
        Ok(())
    })?;
    debug!(sheet = %sheet.name, rows = sheet.rows.len(), "wrote CSV sheet");
    Ok(())
}

/// One Utf8 column per header label; empty cells become nulls.
pub fn write_sheet_parquet(sheet: &Sheet, path: &Path) -> Result<()> {
    let labels = sheet.header.last().cloned().unwrap_or_default();
    let fields: Vec<Field> = labels
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = (0..labels.len())
        .map(|c| {
            let values: Vec<Option<&str>> = sheet
                .rows
                .iter()
                .map(|r| r.get(c).map(String::as_str).filter(|s| !s.is_empty()))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .with_context(|| format!("building record batch for sheet {}", sheet.name))?;

    write_atomic(path, |file| {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))
            .context("initializing Parquet writer")?;
        writer.write(&batch).context("writing batch to Parquet")?;
        writer.close().context("closing Parquet writer")?;
        Ok(())
    })?;
    debug!(sheet = %sheet.name, rows = batch.num_rows(), "wrote Parquet sheet");
    Ok(())
}

pub fn write_summary_csv(rows: &[SummaryRow], path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut wtr = csv::Writer::from_writer(file);
        let mut header: Vec<&str> = SUMMARY_COLUMNS.to_vec();
        header.push("Note");
        wtr.write_record(&header)?;
        for r in rows {
            wtr.write_record([
                r.jurisdiction.as_str(),
                r.category.as_str(),
                r.metric.as_str(),
                r.event_type.as_str(),
                r.value.as_str(),
                r.note.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    })
    .with_context(|| format!("writing events summary {:?}", path))
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, value).context("serializing JSON")?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    })
}

/// Write through `<dir>/.<name>.tmp`, then rename over `path`.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("output path has no file name: {:?}", path))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let tmp = File::create(&tmp_path).with_context(|| format!("creating {:?}", tmp_path))?;
    if let Err(e) = write(tmp) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}
