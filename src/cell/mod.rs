// src/cell/mod.rs
pub mod date;
pub mod duration;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{de::IgnoredAny, Deserialize, Deserializer};

pub use date::{display_date, parse_flight_date};
pub use duration::{format_duration, minutes_from_str, normalize_duration};

/// One raw spreadsheet cell, as handed over by the loading collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// Rich-text or hyperlink cell; only the flattened text is kept.
    RichText { text: String },
    /// Formula cell; only the cached result matters.
    Formula { result: Box<CellValue> },
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// True for null cells and cells whose text is whitespace only.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) | CellValue::RichText { text: s } => s.trim().is_empty(),
            CellValue::Formula { result } => result.is_blank(),
            CellValue::Number(_) | CellValue::Bool(_) | CellValue::Date(_) => false,
        }
    }

    /// Canonical display string. Never fails; blank cells display as `""`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::RichText { text: s } => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Formula { result } => result.display(),
        }
    }

    /// Display string, or `None` when the cell is blank.
    pub fn non_blank_display(&self) -> Option<String> {
        let s = self.display();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Whole numbers print without a fractional part.
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// JSON shape of a cell in `.json` logbooks: scalars plus the two wrapper
/// objects spreadsheet libraries emit (`{"text": ..}` and `{"result": ..}`).
/// Any other shape reads as an empty cell.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCell {
    Bool(bool),
    Number(f64),
    Text(String),
    Rich {
        text: String,
    },
    Formula {
        #[serde(default)]
        result: Option<Box<JsonCell>>,
    },
    Other(IgnoredAny),
}

impl From<JsonCell> for CellValue {
    fn from(raw: JsonCell) -> Self {
        match raw {
            JsonCell::Bool(b) => CellValue::Bool(b),
            JsonCell::Number(n) => CellValue::Number(n),
            JsonCell::Text(s) => CellValue::Text(s),
            JsonCell::Rich { text } => CellValue::RichText { text },
            JsonCell::Formula { result } => CellValue::Formula {
                result: Box::new(result.map(|r| CellValue::from(*r)).unwrap_or_default()),
            },
            JsonCell::Other(_) => CellValue::Empty,
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<JsonCell>::deserialize(deserializer)?;
        Ok(raw.map(CellValue::from).unwrap_or_default())
    }
}
