use std::path::PathBuf;
use thiserror::Error;

/// Structural failures: the input does not have the shape of a logbook at all.
///
/// Messy cell contents and unmatched headers are never reported through this
/// type; they degrade to zero/blank values instead.
#[derive(Error, Debug)]
pub enum LogbookError {
    #[error("no header row found in the first {0} rows")]
    MissingHeaderRow(usize),

    #[error("workbook has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),

    #[error("sheet `{sheet}` not found in {path}")]
    UnknownSheet { path: PathBuf, sheet: String },

    #[error("unsupported logbook file type: {0}")]
    UnsupportedFile(PathBuf),

    #[error("JSON logbook must be an array of objects: {0}")]
    InvalidJsonShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LogbookError>;
