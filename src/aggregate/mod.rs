// src/aggregate/mod.rs
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::cell::parse_flight_date;
use crate::header::{FieldIndex, SemanticField};
use crate::record::{pilot_key, FlightRecord};
use crate::sheet::RawRow;

/// Minute totals per category. Raw minutes only; formatting is left to the
/// report layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PilotSummary {
    pub flight_count: usize,
    pub total_minutes: f64,
    pub pic_minutes: f64,
    pub sic_minutes: f64,
    pub ifr_minutes: f64,
    pub vfr_minutes: f64,
    pub day_minutes: f64,
    pub night_minutes: f64,
}

impl PilotSummary {
    /// Count one flight and add its minutes. Missing fields add nothing.
    pub fn add(&mut self, rec: &FlightRecord) {
        self.flight_count += 1;
        self.total_minutes += rec.total.unwrap_or(0.0);
        self.pic_minutes += rec.pic.unwrap_or(0.0);
        self.sic_minutes += rec.sic.unwrap_or(0.0);
        self.ifr_minutes += rec.ifr.unwrap_or(0.0);
        self.vfr_minutes += rec.vfr.unwrap_or(0.0);
        self.day_minutes += rec.day.unwrap_or(0.0);
        self.night_minutes += rec.night.unwrap_or(0.0);
    }
}

/// Sum every non-blank row. A row counts as a flight even when none of the
/// duration columns resolved.
pub fn summarize<'a, I>(rows: I, index: &FieldIndex) -> PilotSummary
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut summary = PilotSummary::default();
    let mut blank = 0usize;
    for row in rows {
        match FlightRecord::from_row(row, index) {
            Some(rec) => summary.add(&rec),
            None => blank += 1,
        }
    }
    debug!(flights = summary.flight_count, blank, "summarized rows");
    summary
}

/// Per-pilot summaries plus the number of non-blank rows that carried no
/// pilot name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PilotGroups {
    /// Keyed by trimmed pilot name, ordinal ascending.
    pub pilots: BTreeMap<String, PilotSummary>,
    pub unattributed: usize,
}

impl PilotGroups {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pilots.keys().map(String::as_str)
    }
}

pub fn group_by_pilot<'a, I>(rows: I, index: &FieldIndex) -> PilotGroups
where
    I: IntoIterator<Item = &'a RawRow>,
{
    if !index.is_resolved(SemanticField::PilotName) {
        warn!("no pilot name column found; every flight is unattributed");
    }

    let mut groups = PilotGroups::default();
    for row in rows {
        let Some(rec) = FlightRecord::from_row(row, index) else {
            continue;
        };
        match &rec.pilot_name {
            Some(name) => groups.pilots.entry(name.clone()).or_default().add(&rec),
            None => groups.unattributed += 1,
        }
    }
    if groups.unattributed > 0 {
        warn!(rows = groups.unattributed, "rows without a pilot name");
    }
    groups
}

/// Rows whose trimmed pilot name equals `pilot`.
pub fn rows_for_pilot<'a>(
    rows: &'a [RawRow],
    index: &'a FieldIndex,
    pilot: &'a str,
) -> impl Iterator<Item = &'a RawRow> + 'a {
    let wanted = pilot.trim();
    rows.iter()
        .filter(move |row| pilot_key(row, index).as_deref() == Some(wanted))
}

/// The row with the latest flight date. On equal dates the later row wins.
/// `None` when no row has a parseable date.
pub fn select_last_flight<'a, I>(rows: I, index: &FieldIndex) -> Option<&'a RawRow>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let column = index.column(SemanticField::FlightDate)?;
    let mut best: Option<(NaiveDateTime, &'a RawRow)> = None;
    for row in rows {
        let Some(date) = parse_flight_date(row.cell(column)) else {
            continue;
        };
        match best {
            Some((latest, _)) if date < latest => {}
            _ => best = Some((date, row)),
        }
    }
    best.map(|(_, row)| row)
}
