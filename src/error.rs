// src/error.rs

/// Structural problems with the input table. Fatal: nothing is produced.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("input needs two header rows (metric codes + metric names), found {found}")]
    MissingHeaderRows { found: usize },

    #[error("expected at least 3 index columns (year, jurisdiction, category), found {found}")]
    TooFewColumns { found: usize },

    #[error("header rows are misaligned: {codes} metric codes vs {names} metric names")]
    HeaderMismatch { codes: usize, names: usize },

    #[error("metric column {column} has an empty code")]
    EmptyMetricCode { column: usize },

    #[error("metric code `{0}` appears more than once in the header")]
    DuplicateMetricCode(String),
}

/// Invalid run parameters. Fatal, reported before any work starts.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be a finite number > 0, got {0}")]
    InvalidThreshold(f64),

    #[error("target year `{0}` is not a whole year")]
    InvalidTargetYear(String),

    #[error("unknown split mode `{0}` (expected `jurisdiction` or `category`)")]
    UnknownSplitMode(String),

    #[error("unknown duplicate policy `{0}` (expected `keep-first` or `reject`)")]
    UnknownDuplicatePolicy(String),

    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("duplicate rows for {jurisdiction} / {category} in year {year}")]
    DuplicateObservation {
        jurisdiction: String,
        category: String,
        year: String,
    },

    #[error("classification cancelled after {completed_metrics} metrics")]
    Cancelled { completed_metrics: usize },
}
