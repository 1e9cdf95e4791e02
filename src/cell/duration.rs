use super::{date::elapsed_minutes, CellValue};

/// Convert one raw cell into a duration in minutes.
///
/// - blank cells → `0`
/// - `"H:M"` text → `H * 60 + M`, each side parsed as a leading integer
///   (missing or non-numeric sides count as `0`, minutes are not clamped)
/// - formula cells → their cached result
/// - timestamps in the first days of the 1900 serial range → elapsed minutes
/// - anything else → every character except digits, `.` and `-` is dropped and
///   the remainder parsed as a number
///
/// Unparseable input yields `0`; the result is always finite.
pub fn normalize_duration(value: &CellValue) -> f64 {
    match value {
        CellValue::Empty => 0.0,
        CellValue::Text(s) | CellValue::RichText { text: s } => minutes_from_str(s),
        CellValue::Number(n) => finite_or_zero(*n),
        CellValue::Formula { result } => normalize_duration(result),
        CellValue::Date(dt) => elapsed_minutes(dt).unwrap_or(0.0),
        CellValue::Bool(_) => 0.0,
    }
}

/// String path of [`normalize_duration`].
pub fn minutes_from_str(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    if let Some((hours, minutes)) = s.split_once(':') {
        return finite_or_zero(leading_int(hours) * 60.0 + leading_int(minutes));
    }

    let numeric: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if numeric.is_empty() {
        return 0.0;
    }
    numeric.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

/// Render minutes as `HH:MM`, keeping the sign. Hours are padded to two digits
/// but never truncated.
pub fn format_duration(minutes: f64) -> String {
    if !minutes.is_finite() {
        return "00:00".to_string();
    }
    let sign = if minutes < 0.0 { "-" } else { "" };
    // half-way values round up, so -90.5 becomes -90
    let whole = (minutes + 0.5).floor().abs() as u64;
    format!("{}{:02}:{:02}", sign, whole / 60, whole % 60)
}

/// Optional sign followed by digits; anything after the digits is ignored.
fn leading_int(s: &str) -> f64 {
    let s = s.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse::<f64>().map(|n| sign * n).unwrap_or(0.0)
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
