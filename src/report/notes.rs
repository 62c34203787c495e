use crate::events::ClassificationEvent;
use crate::record::MetricCatalog;

/// Human-readable note attached to a flagged cell.
pub fn event_note(event: &ClassificationEvent, catalog: &MetricCatalog) -> String {
    let key = event.key();
    let heading = match event {
        ClassificationEvent::Anomaly { .. } => "Anomaly Detected:",
        ClassificationEvent::Missing { .. } => "Missing Data:",
        ClassificationEvent::NonNumeric { .. } => "Non-Numeric Value:",
    };
    let mut note = format!(
        "{}\nYear: {}\nJurisdiction: {}\nCategory: {}\nMetric: {}",
        heading,
        event.year(),
        key.jurisdiction,
        key.category,
        catalog.label(&key.metric)
    );

    let details = match event {
        ClassificationEvent::Anomaly {
            value,
            mean,
            std_dev,
            z_score,
            history,
            ..
        } => format!(
            "\nValue: {:.2}\nMean: {:.2}\nStd Dev: {:.2}\nZ-Score: {:.2}\nHistorical Data:\n{}",
            value, mean, std_dev, z_score, history
        ),
        ClassificationEvent::Missing { history, .. } => {
            format!("\nHistorical Data:\n{}", history)
        }
        ClassificationEvent::NonNumeric { raw_value, .. } => format!("\nValue: {}", raw_value),
    };
    note.push_str(&details);
    note
}

/// Value column of the events summary.
pub fn summary_value(event: &ClassificationEvent) -> String {
    match event {
        ClassificationEvent::Anomaly { value, .. } => format_number(*value),
        ClassificationEvent::Missing { .. } => "N/A".to_string(),
        ClassificationEvent::NonNumeric { raw_value, .. } => raw_value.clone(),
    }
}

/// Whole numbers without a fractional part, everything else as-is.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
