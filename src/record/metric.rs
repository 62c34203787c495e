use serde::Serialize;
use std::collections::HashMap;

use crate::error::SchemaError;
use crate::record::parse::clean_str;

/// One metric column, identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDefinition {
    pub code: String,
    pub display_name: String,
}

/// Metric definitions in column order, with a code lookup.
///
/// Codes are the only stable identifier once the table is loaded; the
/// physical column of a metric is `INDEX_COLUMNS + position`.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    defs: Vec<MetricDefinition>,
    by_code: HashMap<String, usize>,
}

impl MetricCatalog {
    /// Build from the metric part of the two header rows (already past the
    /// index columns). `first_column` is only used for error messages.
    pub fn from_headers(
        codes: &[String],
        names: &[String],
        first_column: usize,
    ) -> Result<Self, SchemaError> {
        if codes.len() != names.len() {
            return Err(SchemaError::HeaderMismatch {
                codes: codes.len(),
                names: names.len(),
            });
        }

        let mut defs = Vec::with_capacity(codes.len());
        let mut by_code = HashMap::with_capacity(codes.len());
        for (i, (code, name)) in codes.iter().zip(names).enumerate() {
            let code = clean_str(code);
            if code.is_empty() {
                return Err(SchemaError::EmptyMetricCode {
                    column: first_column + i,
                });
            }
            if by_code.insert(code.to_string(), i).is_some() {
                return Err(SchemaError::DuplicateMetricCode(code.to_string()));
            }
            defs.push(MetricDefinition {
                code: code.to_string(),
                display_name: clean_str(name).to_string(),
            });
        }

        Ok(Self { defs, by_code })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.defs
    }

    pub fn get(&self, idx: usize) -> Option<&MetricDefinition> {
        self.defs.get(idx)
    }

    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.by_code.get(code).copied()
    }

    /// Display name for `code`, empty when unknown.
    pub fn display_name(&self, code: &str) -> &str {
        self.index_of(code)
            .map(|i| self.defs[i].display_name.as_str())
            .unwrap_or("")
    }

    /// `code - name` for `code`.
    pub fn label(&self, code: &str) -> String {
        format!("{} - {}", code, self.display_name(code))
    }
}
