use std::collections::HashMap;

use crate::events::{HistoryTrace, TracePoint};
use crate::record::{Cell, DetectionSet};

/// A usable point of a historical series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint<'a> {
    pub year: i32,
    pub raw: &'a str,
    pub value: f64,
}

/// Per-entity history of one metric: every numeric value recorded strictly
/// before the target year, grouped by trimmed (jurisdiction, category) and
/// sorted by year. Rows sharing a year keep their input order.
#[derive(Debug, Default)]
pub struct MetricSeries<'a> {
    by_entity: HashMap<(&'a str, &'a str), Vec<HistoryPoint<'a>>>,
}

impl<'a> MetricSeries<'a> {
    pub fn build(set: &DetectionSet<'a>, metric: usize, target_year: i32) -> Self {
        let mut by_entity: HashMap<(&'a str, &'a str), Vec<HistoryPoint<'a>>> = HashMap::new();

        for o in set.iter() {
            let year = match o.year {
                Some(y) if y < target_year => y,
                _ => continue,
            };
            // non-numeric history values are dropped from the baseline
            let value = match o.cell(metric) {
                Cell::Number(v) => v,
                Cell::Absent | Cell::Text(_) => continue,
            };
            let raw = o.value(metric).unwrap_or_default();
            let category = o.category.as_deref().unwrap_or_default();
            by_entity
                .entry((o.jurisdiction.trim(), category.trim()))
                .or_default()
                .push(HistoryPoint { year, raw, value });
        }

        for points in by_entity.values_mut() {
            points.sort_by_key(|p| p.year);
        }

        Self { by_entity }
    }

    pub fn history(&self, jurisdiction: &'a str, category: &'a str) -> &[HistoryPoint<'a>] {
        self.by_entity
            .get(&(jurisdiction.trim(), category.trim()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

pub fn values(points: &[HistoryPoint<'_>]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

pub fn trace(points: &[HistoryPoint<'_>]) -> HistoryTrace {
    HistoryTrace(
        points
            .iter()
            .map(|p| TracePoint {
                year: p.year,
                raw: p.raw.to_string(),
            })
            .collect(),
    )
}
