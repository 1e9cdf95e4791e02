//! Flight-logbook summaries from loosely formatted spreadsheets.
//!
//! The pipeline is: load a [`sheet::Sheet`], resolve its headers into a
//! [`header::FieldIndex`], then aggregate rows with [`aggregate`]. Cell
//! parsing never fails; unreadable values count as zero or blank.

pub mod aggregate;
pub mod cell;
pub mod config;
pub mod error;
pub mod header;
pub mod record;
pub mod report;
pub mod sheet;

pub use aggregate::{group_by_pilot, select_last_flight, summarize, PilotGroups, PilotSummary};
pub use cell::{format_duration, normalize_duration, CellValue};
pub use error::LogbookError;
pub use header::{resolve_field, FieldIndex, HeaderCatalog, HeaderVariantSet, SemanticField};
pub use sheet::{load_sheet, LoadOptions, RawRow, Sheet};
