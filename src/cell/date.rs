use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::CellValue;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%a %b %d %Y",
    "%b %d %Y",
    "%d %b %Y",
];

/// `20:00:00 GMT-0400 (Chile Standard Time)` and everything after it.
static CLOCK_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\d{1,2}:\d{2}:\d{2}.*$").expect("static regex"));
/// ISO `T12:00...` suffix.
static ISO_TIME_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"T\d.*$").expect("static regex"));

/// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parse a flight-date cell. Returns `None` for blank cells and for anything
/// that is not a recognisable calendar date.
pub fn parse_flight_date(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Date(dt) => Some(*dt),
        CellValue::Number(serial) => from_excel_serial(*serial),
        CellValue::Text(s) | CellValue::RichText { text: s } => parse_date_str(s),
        CellValue::Formula { result } => parse_flight_date(result),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

/// Short display form of a date-like cell: `YYYY-MM-DD` when it parses,
/// otherwise the text with any clock/zone tail removed.
pub fn display_date(value: &CellValue) -> Option<String> {
    if let Some(dt) = parse_flight_date(value) {
        return Some(dt.date().format("%Y-%m-%d").to_string());
    }
    let raw = value.display();
    if raw.is_empty() {
        return None;
    }
    let stripped = strip_time_tail(&raw);
    if stripped.is_empty() {
        Some(raw)
    } else {
        Some(stripped)
    }
}

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Convert an Excel (1900 system) serial to a timestamp.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    excel_epoch()?.checked_add_signed(Duration::seconds(seconds))
}

/// Elapsed minutes for a timestamp that is really an `h:mm` cell holding a
/// day or more (serials below 61, i.e. before 1900-03-01). Real calendar
/// dates give `None`.
pub fn elapsed_minutes(dt: &NaiveDateTime) -> Option<f64> {
    let epoch = excel_epoch()?;
    let cutoff = NaiveDate::from_ymd_opt(1900, 3, 1)?.and_hms_opt(0, 0, 0)?;
    if *dt < epoch || *dt >= cutoff {
        return None;
    }
    Some((*dt - epoch).num_seconds() as f64 / 60.0)
}

fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Some(dt) = parse_date_only(s) {
        return Some(dt);
    }

    let stripped = strip_time_tail(s);
    if stripped.is_empty() || stripped == s {
        return None;
    }
    parse_date_only(&stripped)
}

fn parse_date_only(s: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn strip_time_tail(s: &str) -> String {
    let without_clock = CLOCK_TAIL.replace(s, "");
    ISO_TIME_TAIL.replace(&without_clock, "").trim().to_string()
}
