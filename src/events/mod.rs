// src/events/mod.rs
use serde::Serialize;
use std::{collections::HashMap, fmt};
use tracing::{debug, warn};

use crate::record::EntityKey;

/// One `(year, raw value)` pair of the baseline used for a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracePoint {
    pub year: i32,
    pub raw: String,
}

/// The historical baseline of an event, oldest year first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoryTrace(pub Vec<TracePoint>);

impl HistoryTrace {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HistoryTrace {
    /// One `YEAR: value` line per point.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", p.year, p.raw)?;
        }
        Ok(())
    }
}

/// Tag of a [`ClassificationEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Anomaly,
    Missing,
    NonNumeric,
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Anomaly => "Anomaly",
            EventKind::Missing => "Missing",
            EventKind::NonNumeric => "Non-Numeric",
        }
    }
}

/// Outcome of classifying one target-year cell. A cell judged normal produces
/// no event at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationEvent {
    Anomaly {
        key: EntityKey,
        year: i32,
        /// Source data row of the cell.
        row: usize,
        value: f64,
        mean: f64,
        std_dev: f64,
        z_score: f64,
        history: HistoryTrace,
    },
    /// Value absent while the series has history.
    Missing {
        key: EntityKey,
        year: i32,
        row: usize,
        history: HistoryTrace,
    },
    NonNumeric {
        key: EntityKey,
        year: i32,
        row: usize,
        raw_value: String,
    },
}

impl ClassificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClassificationEvent::Anomaly { .. } => EventKind::Anomaly,
            ClassificationEvent::Missing { .. } => EventKind::Missing,
            ClassificationEvent::NonNumeric { .. } => EventKind::NonNumeric,
        }
    }

    pub fn key(&self) -> &EntityKey {
        match self {
            ClassificationEvent::Anomaly { key, .. }
            | ClassificationEvent::Missing { key, .. }
            | ClassificationEvent::NonNumeric { key, .. } => key,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            ClassificationEvent::Anomaly { year, .. }
            | ClassificationEvent::Missing { year, .. }
            | ClassificationEvent::NonNumeric { year, .. } => *year,
        }
    }

    pub fn row(&self) -> usize {
        match self {
            ClassificationEvent::Anomaly { row, .. }
            | ClassificationEvent::Missing { row, .. }
            | ClassificationEvent::NonNumeric { row, .. } => *row,
        }
    }

    pub fn history(&self) -> Option<&HistoryTrace> {
        match self {
            ClassificationEvent::Anomaly { history, .. }
            | ClassificationEvent::Missing { history, .. } => Some(history),
            ClassificationEvent::NonNumeric { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub anomalies: usize,
    pub missing: usize,
    pub non_numeric: usize,
}

impl EventCounts {
    pub fn total(&self) -> usize {
        self.anomalies + self.missing + self.non_numeric
    }
}

/// Events sorted for human review, with a lookup by entity key.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: Vec<ClassificationEvent>,
    by_key: HashMap<EntityKey, usize>,
}

impl EventIndex {
    /// Sorted by jurisdiction (ordinal, case-sensitive), ties in insertion order.
    pub fn events(&self) -> &[ClassificationEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassificationEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event recorded for `key` in the target year.
    pub fn get(&self, key: &EntityKey) -> Option<&ClassificationEvent> {
        self.by_key.get(key).map(|&i| &self.events[i])
    }

    pub fn counts(&self) -> EventCounts {
        let mut counts = EventCounts::default();
        for e in &self.events {
            match e.kind() {
                EventKind::Anomaly => counts.anomalies += 1,
                EventKind::Missing => counts.missing += 1,
                EventKind::NonNumeric => counts.non_numeric += 1,
            }
        }
        counts
    }
}

/// Sort classifier output for the summary and index target-year events by key.
///
/// The sort is stable, so running this twice over the same input gives the
/// same order. If two events share a key the first one in sorted order is the
/// one the lookup returns.
pub fn aggregate(mut events: Vec<ClassificationEvent>, target_year: i32) -> EventIndex {
    events.sort_by(|a, b| a.key().jurisdiction.cmp(&b.key().jurisdiction));

    let mut by_key = HashMap::with_capacity(events.len());
    let mut collisions = 0usize;
    for (i, e) in events.iter().enumerate() {
        if e.year() != target_year {
            continue;
        }
        if by_key.contains_key(e.key()) {
            collisions += 1;
            debug!(key = %e.key(), row = e.row(), "second event for the same key");
            continue;
        }
        by_key.insert(e.key().clone(), i);
    }
    if collisions > 0 {
        warn!(
            collisions,
            "several target-year rows share a key; lookups use the first event"
        );
    }

    EventIndex { events, by_key }
}
