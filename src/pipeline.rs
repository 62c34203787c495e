// src/pipeline.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::{path::PathBuf, time::Instant};
use tracing::info;

use crate::config::RunConfig;
use crate::detect::{classify_with_cancel, CancelToken};
use crate::events::{aggregate, EventCounts};
use crate::pivot::pivot;
use crate::record::{load_observations, reader::read_raw_table};
use crate::report::{write_report, ReportBinder, ReportFiles};

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output: PathBuf,
    pub counts: EventCounts,
    pub pivot_rows: usize,
    pub duplicate_rows: usize,
    pub files: ReportFiles,
}

pub fn run(config: &RunConfig) -> Result<RunSummary> {
    run_with_cancel(config, &CancelToken::new())
}

/// Read the input, classify and reshape it, and write the report.
#[tracing::instrument(
    level = "info",
    skip(config, cancel),
    fields(input = %config.input.display(), output = %config.output.display())
)]
pub fn run_with_cancel(config: &RunConfig, cancel: &CancelToken) -> Result<RunSummary> {
    let start = Instant::now();

    // 1) load
    let raw = read_raw_table(&config.input)?;
    let table = load_observations(&raw)
        .with_context(|| format!("Invalid input table: {:?}", config.input))?;
    let set = table.detection_set();
    info!(
        observations = table.observations.len(),
        detection_rows = set.len(),
        metrics = table.catalog.len(),
        "input loaded"
    );

    // 2) classify and reshape, independently of each other
    let (events, pivoted) = rayon::join(
        || classify_with_cancel(&set, &config.detect, cancel),
        || pivot(&set, config.on_duplicate),
    );
    let events = aggregate(events?, config.detect.target_year());
    let pivoted = pivoted?;

    // 3) bind and write
    let report = ReportBinder::new(&raw, &table, &pivoted, &events, config.detect)
        .split_by(config.split_by)
        .bind();
    let files = write_report(&report, &config.output)
        .with_context(|| format!("Failed to write report to {:?}", config.output))?;

    let counts = events.counts();
    info!(
        anomalies = counts.anomalies,
        missing = counts.missing,
        non_numeric = counts.non_numeric,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );

    Ok(RunSummary {
        output: config.output.clone(),
        counts,
        pivot_rows: pivoted.len(),
        duplicate_rows: pivoted.duplicate_rows,
        files,
    })
}
