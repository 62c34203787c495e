use serde::Serialize;
use std::collections::HashSet;

use super::hint::PresentationHint;

/// Presentation-layer length limit on sheet names (spreadsheet tabs).
pub const MAX_SHEET_NAME: usize = 31;

/// A styling instruction for one body cell. `row` and `column` are zero-based
/// positions in [`Sheet::rows`], header rows not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellAnnotation {
    pub row: usize,
    pub column: usize,
    pub hint: PresentationHint,
    pub fill: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CellAnnotation {
    pub fn new(row: usize, column: usize, hint: PresentationHint, note: Option<String>) -> Self {
        Self {
            row,
            column,
            hint,
            fill: hint.fill_color(),
            note,
        }
    }
}

/// One output table: header rows, body rows and the annotations on the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    #[serde(skip)]
    pub header: Vec<Vec<String>>,
    #[serde(skip)]
    pub rows: Vec<Vec<String>>,
    pub annotations: Vec<CellAnnotation>,
}

impl Sheet {
    pub fn annotation_at(&self, row: usize, column: usize) -> Option<&CellAnnotation> {
        self.annotations
            .iter()
            .find(|a| a.row == row && a.column == column)
    }
}

/// Hands out sheet names no longer than [`MAX_SHEET_NAME`] that are unique
/// ignoring case, so they can double as file names.
#[derive(Debug, Default)]
pub struct SheetNamer {
    /// Lowercased names already handed out.
    used: HashSet<String>,
}

impl SheetNamer {
    /// Names already taken by fixed sheets.
    pub fn with_reserved<I: IntoIterator<Item = S>, S: Into<String>>(reserved: I) -> Self {
        Self {
            used: reserved
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
        }
    }

    pub fn name(&mut self, label: &str) -> String {
        let cleaned: String = label
            .trim()
            .chars()
            .map(|c| match c {
                '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        let base = if cleaned.is_empty() {
            "(blank)".to_string()
        } else {
            cleaned
        };

        let mut candidate = truncate_chars(&base, MAX_SHEET_NAME);
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!("~{}", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{}", truncate_chars(&base, keep), suffix);
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_truncated_and_unique() {
        let mut namer = SheetNamer::with_reserved(["Data"]);
        let long = "Department of Public Works and Utilities";
        let first = namer.name(long);
        assert_eq!(first.chars().count(), MAX_SHEET_NAME);
        assert_eq!(first, "Department of Public Works and ");
        let second = namer.name(long);
        assert_eq!(second, "Department of Public Works an~2");
        assert_eq!(namer.name("Data"), "Data~2");
        assert_eq!(namer.name("a/b"), "a_b");
        assert_eq!(namer.name("  "), "(blank)");
    }

    #[test]
    fn names_differing_only_in_case_do_not_collide() {
        let mut namer = SheetNamer::with_reserved(["Data"]);
        assert_eq!(namer.name("Albany"), "Albany");
        assert_eq!(namer.name("albany"), "albany~2");
        assert_eq!(namer.name("ALBANY"), "ALBANY~3");
        assert_eq!(namer.name("data"), "data~2");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("Montréal-Est", 8), "Montréal");
    }
}
