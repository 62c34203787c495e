// src/detect/mod.rs
pub mod series;
pub mod stats;

use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use tracing::{debug, info, trace};

use crate::error::{ConfigError, EngineError};
use crate::events::ClassificationEvent;
use crate::record::{parse, Cell, DetectionSet};
use series::MetricSeries;
use stats::Baseline;

/// Threshold and target year of a detection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectConfig {
    threshold: f64,
    target_year: i32,
}

impl DetectConfig {
    pub fn new(threshold: f64, target_year: i32) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            target_year,
        })
    }

    /// Same as [`DetectConfig::new`] with the year given as text, parsed the
    /// way year fields of the table are parsed.
    pub fn parse(threshold: f64, target_year: &str) -> Result<Self, ConfigError> {
        let year = parse::parse_year(target_year)
            .ok_or_else(|| ConfigError::InvalidTargetYear(target_year.to_string()))?;
        Self::new(threshold, year)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn target_year(&self) -> i32 {
        self.target_year
    }
}

/// Cooperative cancellation, checked between metrics.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Classify every target-year cell of the detection set against the history
/// of its own jurisdiction + category.
///
/// Events come out grouped by metric (catalog order), then in input row order.
pub fn classify(
    set: &DetectionSet<'_>,
    config: &DetectConfig,
) -> Result<Vec<ClassificationEvent>, EngineError> {
    classify_with_cancel(set, config, &CancelToken::new())
}

#[tracing::instrument(
    level = "info",
    skip(set, config, cancel),
    fields(rows = set.len(), target_year = config.target_year(), threshold = config.threshold())
)]
pub fn classify_with_cancel(
    set: &DetectionSet<'_>,
    config: &DetectConfig,
    cancel: &CancelToken,
) -> Result<Vec<ClassificationEvent>, EngineError> {
    let metrics = set.catalog().len();
    let completed = AtomicUsize::new(0);

    let per_metric: Vec<Vec<ClassificationEvent>> = (0..metrics)
        .into_par_iter()
        .map(|m| {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled {
                    completed_metrics: completed.load(Ordering::Relaxed),
                });
            }
            let events = classify_metric(set, m, config);
            completed.fetch_add(1, Ordering::Relaxed);
            Ok(events)
        })
        .collect::<Result<_, _>>()?;

    let events: Vec<ClassificationEvent> = per_metric.into_iter().flatten().collect();
    info!(events = events.len(), metrics, "classification complete");
    Ok(events)
}

/// Classify one metric column. Each cell is independent of every other.
fn classify_metric(
    set: &DetectionSet<'_>,
    metric: usize,
    config: &DetectConfig,
) -> Vec<ClassificationEvent> {
    let Some(def) = set.catalog().get(metric) else {
        return Vec::new();
    };
    let target_year = config.target_year();
    let series = MetricSeries::build(set, metric, target_year);
    let mut events = Vec::new();

    for o in set.iter().filter(|o| o.year == Some(target_year)) {
        let category = o.category.as_deref().unwrap_or_default();
        match o.cell(metric) {
            Cell::Text(raw) => {
                events.push(ClassificationEvent::NonNumeric {
                    key: o.entity_key(&def.code),
                    year: target_year,
                    row: o.row,
                    raw_value: raw.to_string(),
                });
            }
            Cell::Absent => {
                let history = series.history(&o.jurisdiction, category);
                if history.is_empty() {
                    continue; // nothing to compare against
                }
                events.push(ClassificationEvent::Missing {
                    key: o.entity_key(&def.code),
                    year: target_year,
                    row: o.row,
                    history: series::trace(history),
                });
            }
            Cell::Number(value) => {
                let history = series.history(&o.jurisdiction, category);
                let Some(baseline) = Baseline::from_values(&series::values(history)) else {
                    trace!(row = o.row, metric = %def.code, points = history.len(), "insufficient history");
                    continue;
                };
                let z_score = baseline.z_score(value);
                if z_score.abs() <= config.threshold() {
                    continue;
                }
                events.push(ClassificationEvent::Anomaly {
                    key: o.entity_key(&def.code),
                    year: target_year,
                    row: o.row,
                    value,
                    mean: baseline.mean,
                    std_dev: baseline.std_dev,
                    z_score,
                    history: series::trace(history),
                });
            }
        }
    }

    debug!(metric = %def.code, events = events.len(), "classified metric");
    events
}
