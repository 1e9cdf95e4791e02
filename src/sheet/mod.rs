// src/sheet/mod.rs
pub mod load;

use std::collections::BTreeMap;
use tracing::debug;

use crate::cell::CellValue;
use crate::error::{LogbookError, Result};
use crate::header::{FieldIndex, HeaderCatalog, SemanticField};

pub use load::{load_sheet, LoadOptions};

/// Rows scanned when looking for the header row.
pub const DEFAULT_HEADER_SEARCH_ROWS: usize = 10;

/// One data row. Cells are positional and line up with [`Sheet::headers`];
/// a row may be shorter than the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `column`; missing trailing cells read as empty.
    pub fn cell(&self, column: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// Cell for a semantic field, `None` if the field has no column.
    pub fn field(&self, index: &FieldIndex, field: SemanticField) -> Option<&CellValue> {
        index.column(field).map(|c| self.cell(c))
    }

    /// Every cell is null or whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }
}

impl<C: Into<CellValue>> FromIterator<C> for RawRow {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// A header row plus the data rows below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl Sheet {
    /// Headers are trimmed. At least one must be non-blank.
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Result<Self> {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(LogbookError::MissingHeaderRow(0));
        }
        Ok(Self { headers, rows })
    }

    /// Build a sheet from a grid of cells: the first row with any non-blank
    /// cell among the first `search_rows` rows becomes the header row.
    pub fn from_grid(grid: Vec<Vec<CellValue>>, search_rows: usize) -> Result<Self> {
        let header_pos = grid
            .iter()
            .take(search_rows)
            .position(|row| row.iter().any(|c| !c.is_blank()))
            .ok_or(LogbookError::MissingHeaderRow(search_rows))?;

        let mut rows = grid.into_iter().skip(header_pos);
        let headers = rows
            .next()
            .map(|cells| cells.iter().map(CellValue::display).collect())
            .unwrap_or_default();
        let rows: Vec<RawRow> = rows.map(RawRow::new).collect();
        debug!(header_row = header_pos, rows = rows.len(), "sheet materialised");
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn field_index(&self, catalog: &HeaderCatalog) -> FieldIndex {
        FieldIndex::resolve(&self.headers, catalog)
    }

    /// `header → display string` view of a row, for record-shaped output.
    /// Blank headers are skipped; on duplicate headers the rightmost wins.
    pub fn row_map(&self, row: &RawRow) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.clone(), row.cell(i).display()))
            .collect()
    }
}
