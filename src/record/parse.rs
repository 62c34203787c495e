// src/record/parse.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// `1,234` / `-12,345,678.90`: digit groups separated by thousands commas.
static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d*)?$").unwrap());

/// Tokens spreadsheet exports use for "no value". Matched after cleaning.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A metric cell after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Absent,
    Number(f64),
    Text(&'a str),
}

impl<'a> Cell<'a> {
    /// Coerce an optional raw cell. `None` and NA tokens are both `Absent`.
    pub fn from_raw(raw: Option<&'a str>) -> Self {
        match raw {
            None => Cell::Absent,
            Some(s) if is_absent(s) => Cell::Absent,
            Some(s) => match parse_number(s) {
                Some(v) => Cell::Number(v),
                None => Cell::Text(clean_str(s)),
            },
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }
}

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

pub fn is_absent(raw: &str) -> bool {
    NA_TOKENS.contains(&clean_str(raw))
}

/// Parse a present cell as a finite number, accepting thousands separators.
/// `inf`/`infinity` are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = clean_str(raw);
    let v: f64 = if THOUSANDS.is_match(s) {
        s.replace(',', "").parse().ok()?
    } else {
        s.parse().ok()?
    };
    v.is_finite().then_some(v)
}

/// Parse a fiscal year: numeric, integral, and representable as `i32`.
/// `2023` and `2023.0` are the same year.
pub fn parse_year(raw: &str) -> Option<i32> {
    let v = parse_number(raw)?;
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v as i32)
}
