use serde::{Deserialize, Serialize};
use std::fmt;

/// (jurisdiction, category, metric) identifying one yearly series.
///
/// Join key between the original layout, the pivoted layout and events.
/// Always build it through [`EntityKey::new`] so every side trims the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub jurisdiction: String,
    pub category: String,
    pub metric: String,
}

impl EntityKey {
    pub fn new(jurisdiction: &str, category: &str, metric: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.trim().to_string(),
            category: category.trim().to_string(),
            metric: metric.trim().to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.jurisdiction, self.category, self.metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_every_component() {
        assert_eq!(
            EntityKey::new("  Springfield ", "\tLibraries", " m1 "),
            EntityKey::new("Springfield", "Libraries", "m1")
        );
    }

    #[test]
    fn orders_by_jurisdiction_then_category_then_metric() {
        let mut keys = vec![
            EntityKey::new("b", "x", "m1"),
            EntityKey::new("a", "y", "m1"),
            EntityKey::new("a", "x", "m2"),
            EntityKey::new("a", "x", "m1"),
        ];
        keys.sort();
        let flat: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            flat,
            vec!["a / x / m1", "a / x / m2", "a / y / m1", "b / x / m1"]
        );
    }
}
