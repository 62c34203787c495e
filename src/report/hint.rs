use serde::Serialize;

use crate::events::EventKind;

/// How a cell should be painted. Renderers decide what that means for their
/// format; the fill colours and note sizes are those of the spreadsheet output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationHint {
    Anomaly,
    Missing,
    NonNumeric,
    /// Numeric target-year value with no event.
    Valid,
}

impl PresentationHint {
    /// RGB hex fill colour.
    pub fn fill_color(&self) -> &'static str {
        match self {
            PresentationHint::Anomaly => "FFAAAA",
            PresentationHint::Missing => "E0FFFF",
            PresentationHint::NonNumeric => "FFFF99",
            PresentationHint::Valid => "90EE90",
        }
    }

    /// Width and height of the note box, if the hint carries a note.
    pub fn note_size(&self) -> Option<(u32, u32)> {
        match self {
            PresentationHint::Anomaly => Some((350, 300)),
            PresentationHint::Missing => Some((300, 200)),
            PresentationHint::NonNumeric => Some((300, 100)),
            PresentationHint::Valid => None,
        }
    }
}

impl From<EventKind> for PresentationHint {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Anomaly => PresentationHint::Anomaly,
            EventKind::Missing => PresentationHint::Missing,
            EventKind::NonNumeric => PresentationHint::NonNumeric,
        }
    }
}
