// src/sheet/load.rs
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use super::{RawRow, Sheet, DEFAULT_HEADER_SEARCH_ROWS};
use crate::cell::{date::from_excel_serial, format_duration, CellValue};
use crate::error::LogbookError;

/// `PT1H30M`-style durations some writers emit for `[h]:mm` cells.
static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?$")
        .expect("static regex")
});

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Worksheet to read; the first one when `None`.
    pub sheet: Option<String>,
    /// How far down to look for the header row.
    pub header_search_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            header_search_rows: DEFAULT_HEADER_SEARCH_ROWS,
        }
    }
}

/// Read a logbook file into a [`Sheet`]. The format is picked from the
/// extension: spreadsheets via calamine, `.csv`, or `.json` (an array of
/// `header → value` objects).
#[tracing::instrument(level = "info", skip(path, opts), fields(path = %path.as_ref().display()))]
pub fn load_sheet<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> Result<Sheet> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let sheet = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, opts)?,
        "csv" => load_csv(path, opts)?,
        "json" => load_json(path)?,
        _ => return Err(LogbookError::UnsupportedFile(path.to_path_buf()).into()),
    };

    info!(
        columns = sheet.headers().len(),
        rows = sheet.rows().len(),
        "loaded logbook"
    );
    Ok(sheet)
}

fn load_workbook(path: &Path, opts: &LoadOptions) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)
        .map_err(LogbookError::from)
        .with_context(|| format!("opening workbook {:?}", path))?;

    let names = workbook.sheet_names();
    let name = match &opts.sheet {
        Some(wanted) => names
            .iter()
            .find(|n| *n == wanted)
            .cloned()
            .ok_or_else(|| LogbookError::UnknownSheet {
                path: path.to_path_buf(),
                sheet: wanted.clone(),
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| LogbookError::EmptyWorkbook(path.to_path_buf()))?,
    };
    debug!(sheet = %name, "reading worksheet");

    let range = workbook
        .worksheet_range(&name)
        .map_err(LogbookError::from)
        .with_context(|| format!("reading sheet `{}` of {:?}", name, path))?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Sheet::from_grid(grid, opts.header_search_rows)
        .with_context(|| format!("materialising sheet `{}` of {:?}", name, path))
}

fn load_csv(path: &Path, opts: &LoadOptions) -> Result<Sheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(LogbookError::from)
        .with_context(|| format!("opening CSV {:?}", path))?;

    // Byte records, so a Latin-1 name only garbles its own cell.
    let mut grid = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result
            .map_err(LogbookError::from)
            .with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        grid.push(
            record
                .iter()
                .map(|field| CellValue::text(String::from_utf8_lossy(field)))
                .collect(),
        );
    }

    Sheet::from_grid(grid, opts.header_search_rows)
        .with_context(|| format!("materialising CSV {:?}", path))
}

fn load_json(path: &Path) -> Result<Sheet> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    sheet_from_json(&text).with_context(|| format!("parsing {:?}", path))
}

/// Rows are objects keyed by header. Headers are the union of keys in
/// first-seen order; a key missing from a row reads as an empty cell.
pub fn sheet_from_json(text: &str) -> std::result::Result<Sheet, LogbookError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(LogbookError::InvalidJsonShape("top level is not an array".into()));
    };

    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => objects.push(obj),
            other => {
                return Err(LogbookError::InvalidJsonShape(format!(
                    "item {} is {}",
                    idx,
                    json_kind(&other)
                )))
            }
        }
    }

    let mut headers: Vec<String> = Vec::new();
    for obj in &objects {
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return Err(LogbookError::MissingHeaderRow(0));
    }

    let mut rows = Vec::with_capacity(objects.len());
    for mut obj in objects {
        let mut cells = Vec::with_capacity(headers.len());
        for h in &headers {
            let cell = match obj.remove(h) {
                Some(v) => serde_json::from_value::<CellValue>(v)?,
                None => CellValue::Empty,
            };
            cells.push(cell);
        }
        rows.push(RawRow::new(cells));
    }

    Sheet::new(headers, rows)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map a calamine cell onto [`CellValue`]. Time-of-day and duration cells
/// become `HH:MM` text, matching what a person typed into the sheet.
fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if dt.is_duration() || (0.0..1.0).contains(&serial) {
                CellValue::Text(format_duration(serial * 1440.0))
            } else {
                from_excel_serial(serial)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Number(serial))
            }
        }
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => iso_duration_minutes(s)
            .map(|m| CellValue::Text(format_duration(m)))
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::Error(e) => {
            warn!(error = ?e, "cell holds a spreadsheet error; treating as empty");
            CellValue::Empty
        }
    }
}

fn iso_duration_minutes(s: &str) -> Option<f64> {
    let caps = ISO_DURATION.captures(s.trim())?;
    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Some(part(1) * 60.0 + part(2) + part(3) / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::header::HeaderCatalog;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_bytes(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut tmp = Builder::new().suffix(suffix).tempfile().unwrap();
        tmp.write_all(content).unwrap();
        tmp
    }

    fn temp_with(suffix: &str, content: &str) -> NamedTempFile {
        temp_bytes(suffix, content.as_bytes())
    }

    fn excel_time(serial: f64, kind: ExcelDateTimeType) -> Data {
        Data::DateTime(ExcelDateTime::new(serial, kind, false))
    }

    #[test]
    fn test_load_csv_keeps_blank_rows() -> Result<()> {
        let tmp = temp_with(
            ".csv",
            "Pilot Full Name,PIC Time (HH:MM),SIC Time (HH:MM)\n\
             Alice,01:30,\n\
             ,,\n\
             Bob,00:45,00:15\n",
        );
        let sheet = load_sheet(tmp.path(), &LoadOptions::default())?;
        assert_eq!(
            sheet.headers(),
            &["Pilot Full Name", "PIC Time (HH:MM)", "SIC Time (HH:MM)"]
        );
        assert_eq!(sheet.rows().len(), 3);
        assert!(sheet.rows()[1].is_blank());
        assert_eq!(sheet.rows()[2].cell(0), &CellValue::text("Bob"));
        Ok(())
    }

    #[test]
    fn test_load_csv_with_latin1_names() -> Result<()> {
        let tmp = temp_bytes(
            ".csv",
            b"Pilot Name,PIC\nAlice,01:00\nJos\xe9 P\xe9rez,00:30\n",
        );
        let sheet = load_sheet(tmp.path(), &LoadOptions::default())?;
        assert_eq!(sheet.rows().len(), 2);
        assert!(sheet.rows()[1].cell(0).display().starts_with("Jos"));

        let index = sheet.field_index(&HeaderCatalog::default());
        let summary = summarize(sheet.rows(), &index);
        assert_eq!(summary.flight_count, 2);
        assert_eq!(summary.pic_minutes, 90.0);
        Ok(())
    }

    #[test]
    fn test_load_csv_header_after_title_rows() -> Result<()> {
        let tmp = temp_with(".csv", ",\n,\nName,PIC\nAlice,1:00\n");
        let sheet = load_sheet(tmp.path(), &LoadOptions::default())?;
        assert_eq!(sheet.headers(), &["Name", "PIC"]);
        assert_eq!(sheet.rows().len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_json_with_wrappers() -> Result<()> {
        let tmp = temp_with(
            ".json",
            r#"[
                {"Pilot Name": {"text": "Alice"}, "PIC": "01:30"},
                {"Pilot Name": "Bob", "PIC": {"formula": "B2*2", "result": 90}, "Notes": "x"},
                {}
            ]"#,
        );
        let sheet = load_sheet(tmp.path(), &LoadOptions::default())?;
        assert_eq!(sheet.headers(), &["Pilot Name", "PIC", "Notes"]);
        assert_eq!(sheet.rows().len(), 3);
        assert_eq!(
            sheet.rows()[0].cell(0),
            &CellValue::RichText {
                text: "Alice".into()
            }
        );
        assert_eq!(sheet.rows()[0].cell(2), &CellValue::Empty);
        assert!(sheet.rows()[2].is_blank());
        Ok(())
    }

    #[test]
    fn test_json_odd_cell_does_not_sink_the_row() -> Result<()> {
        let sheet = sheet_from_json(
            r#"[{"Pilot Name": "Alice", "PIC": "01:00", "Remarks": ["a", "b"]},
                {"Pilot Name": "Alice", "PIC": 30, "Remarks": {"style": 1, "text": 2}}]"#,
        )?;
        assert_eq!(sheet.rows()[0].cell(2), &CellValue::Empty);

        let index = sheet.field_index(&HeaderCatalog::default());
        let summary = summarize(sheet.rows(), &index);
        assert_eq!(summary.flight_count, 2);
        assert_eq!(summary.pic_minutes, 90.0);
        Ok(())
    }

    #[test]
    fn test_json_shape_errors() {
        assert!(matches!(
            sheet_from_json(r#"{"a": 1}"#),
            Err(LogbookError::InvalidJsonShape(_))
        ));
        assert!(matches!(
            sheet_from_json(r#"[{"a": 1}, 3]"#),
            Err(LogbookError::InvalidJsonShape(_))
        ));
        assert!(matches!(
            sheet_from_json("[]"),
            Err(LogbookError::MissingHeaderRow(_))
        ));
        assert!(matches!(sheet_from_json("not json"), Err(LogbookError::Json(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = temp_with(".txt", "hello");
        let err = load_sheet(tmp.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LogbookError>(),
            Some(LogbookError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_iso_durations() {
        assert_eq!(iso_duration_minutes("PT1H30M"), Some(90.0));
        assert_eq!(iso_duration_minutes("PT45M"), Some(45.0));
        assert_eq!(iso_duration_minutes("PT2H0M30S"), Some(120.5));
        assert_eq!(iso_duration_minutes("1:30"), None);
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
        assert_eq!(
            cell_from_data(&Data::String("EGLL".into())),
            CellValue::text("EGLL")
        );
    }

    #[test]
    fn test_time_and_duration_cells_become_hh_mm() {
        assert_eq!(
            cell_from_data(&excel_time(0.0625, ExcelDateTimeType::DateTime)),
            CellValue::text("01:30")
        );
        assert_eq!(
            cell_from_data(&excel_time(1.5, ExcelDateTimeType::TimeDelta)),
            CellValue::text("36:00")
        );
        assert_eq!(
            cell_from_data(&Data::DurationIso("PT1H30M".into())),
            CellValue::text("01:30")
        );
        assert_eq!(
            cell_from_data(&Data::DurationIso("P1D".into())),
            CellValue::text("P1D")
        );
    }

    #[test]
    fn test_date_cells_become_dates() {
        let june_first = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            cell_from_data(&excel_time(45078.0, ExcelDateTimeType::DateTime)),
            CellValue::Date(june_first)
        );
    }

    #[test]
    fn test_day_overflow_time_cell_still_sums() {
        // 25:30 in a plain h:mm cell loads as a 1899-12-31 timestamp
        let cell = cell_from_data(&excel_time(1.0625, ExcelDateTimeType::DateTime));
        assert!(matches!(cell, CellValue::Date(_)));
        assert_eq!(crate::cell::normalize_duration(&cell), 1530.0);
    }

    #[test]
    fn test_spreadsheet_error_cells_are_empty() {
        assert_eq!(
            cell_from_data(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Empty
        );
    }
}
