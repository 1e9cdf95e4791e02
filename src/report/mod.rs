// src/report/mod.rs
//! Presentation-ready views over the aggregates: minutes paired with their
//! `HH:MM` form, the last-flight card, and header diagnostics.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::aggregate::{
    group_by_pilot, rows_for_pilot, select_last_flight, summarize, PilotGroups, PilotSummary,
};
use crate::cell::{display_date, format_duration};
use crate::header::{FieldIndex, Resolution, SemanticField};
use crate::record::{FlightRecord, PilotProfile};
use crate::sheet::{RawRow, Sheet};

/// Which rows a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Pilot(String),
}

impl Selection {
    /// The preferred pilot when present in the logbook, else the first name
    /// in sorted order, else every row.
    pub fn default_for(groups: &PilotGroups, preferred: Option<&str>) -> Self {
        if let Some(p) = preferred.map(str::trim) {
            if groups.pilots.contains_key(p) {
                return Selection::Pilot(p.to_string());
            }
        }
        groups
            .names()
            .next()
            .map(|n| Selection::Pilot(n.to_string()))
            .unwrap_or(Selection::All)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duration {
    pub minutes: f64,
    pub hhmm: String,
}

impl From<f64> for Duration {
    fn from(minutes: f64) -> Self {
        Self {
            minutes,
            hhmm: format_duration(minutes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub flights: usize,
    pub total: Duration,
    pub pic: Duration,
    pub sic: Duration,
    pub ifr: Duration,
    pub day: Duration,
    pub night: Duration,
}

impl From<&PilotSummary> for SummaryView {
    fn from(s: &PilotSummary) -> Self {
        Self {
            flights: s.flight_count,
            total: s.total_minutes.into(),
            pic: s.pic_minutes.into(),
            sic: s.sic_minutes.into(),
            ifr: s.ifr_minutes.into(),
            day: s.day_minutes.into(),
            night: s.night_minutes.into(),
        }
    }
}

/// PIC / SIC / IFR / VFR minutes, the data behind the hours breakdown chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub pic: f64,
    pub sic: f64,
    pub ifr: f64,
    pub vfr: f64,
}

impl From<&PilotSummary> for Breakdown {
    fn from(s: &PilotSummary) -> Self {
        Self {
            pic: s.pic_minutes,
            sic: s.sic_minutes,
            ifr: s.ifr_minutes,
            vfr: s.vfr_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    #[serde(rename = "Solo (PIC)")]
    Solo,
    #[serde(rename = "PIC")]
    Pic,
    #[serde(rename = "SIC")]
    Sic,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Solo => "Solo (PIC)",
            Role::Pic => "PIC",
            Role::Sic => "SIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Approaches {
    pub count: u32,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastFlightView {
    pub date: Option<String>,
    pub aircraft_model: Option<String>,
    pub aircraft_reg: Option<String>,
    pub route_from: Option<String>,
    pub route_to: Option<String>,
    /// Total time as written in the sheet, `00:00` when absent.
    pub total: String,
    pub ifr: bool,
    pub night: bool,
    pub role: Role,
    /// Only set for IFR flights.
    pub approaches: Option<Approaches>,
    /// The whole row, `header → display string`.
    pub row: BTreeMap<String, String>,
}

impl LastFlightView {
    pub fn new(sheet: &Sheet, index: &FieldIndex, row: &RawRow) -> Option<Self> {
        let rec = FlightRecord::from_row(row, index)?;
        let positive = |m: Option<f64>| m.unwrap_or(0.0) > 0.0;

        let ifr = positive(rec.ifr);
        let role = if positive(rec.solo) {
            Role::Solo
        } else if rec.pic.unwrap_or(0.0) >= rec.sic.unwrap_or(0.0) {
            Role::Pic
        } else {
            Role::Sic
        };
        let total = row
            .field(index, SemanticField::Total)
            .and_then(|c| c.non_blank_display())
            .unwrap_or_else(|| "00:00".to_string());

        Some(Self {
            date: row
                .field(index, SemanticField::FlightDate)
                .and_then(display_date),
            aircraft_model: rec.aircraft_model,
            aircraft_reg: rec.aircraft_reg,
            route_from: rec.route_from,
            route_to: rec.route_to,
            total,
            ifr,
            night: positive(rec.night),
            role,
            approaches: ifr.then(|| Approaches {
                count: rec.approach_count.unwrap_or(0),
                kind: rec.approach_type,
            }),
            row: sheet.row_map(row),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub unresolved_fields: Vec<SemanticField>,
    pub blank_rows: usize,
    pub unattributed_rows: usize,
}

/// Everything shown for one logbook and one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogbookReport {
    pub source: String,
    pub pilot: Option<String>,
    pub pilots: Vec<String>,
    pub summary: SummaryView,
    pub breakdown: Breakdown,
    pub profile: Option<PilotProfile>,
    pub last_flight: Option<LastFlightView>,
    pub diagnostics: Diagnostics,
}

impl LogbookReport {
    pub fn build(source: &str, sheet: &Sheet, index: &FieldIndex, selection: &Selection) -> Self {
        let groups = group_by_pilot(sheet.rows(), index);
        let selected: Vec<&RawRow> = match selection {
            Selection::All => sheet.rows().iter().collect(),
            Selection::Pilot(name) => rows_for_pilot(sheet.rows(), index, name).collect(),
        };

        let summary = summarize(selected.iter().copied(), index);
        let last_flight = select_last_flight(selected.iter().copied(), index)
            .and_then(|row| LastFlightView::new(sheet, index, row));

        Self {
            source: source.to_string(),
            pilot: match selection {
                Selection::All => None,
                Selection::Pilot(name) => Some(name.clone()),
            },
            pilots: groups.names().map(str::to_string).collect(),
            summary: SummaryView::from(&summary),
            breakdown: Breakdown::from(&summary),
            profile: PilotProfile::from_rows(selected.iter().copied(), index),
            last_flight,
            diagnostics: Diagnostics {
                unresolved_fields: index.unresolved(),
                blank_rows: sheet.rows().iter().filter(|r| r.is_blank()).count(),
                unattributed_rows: groups.unattributed,
            },
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "—".to_string());

        writeln!(out, "==== {} ====", self.source)?;
        writeln!(
            out,
            "Pilot: {}",
            self.pilot.as_deref().unwrap_or("(all rows)")
        )?;

        if let Some(p) = &self.profile {
            writeln!(out, "\n[Profile]")?;
            writeln!(out, "  Name: {}", dash(&p.name))?;
            let optional = [
                ("License Number", &p.license_number),
                ("Nationality", &p.nationality),
                ("Date of Birth", &p.date_of_birth),
                ("License Type", &p.license_type),
                ("License Issue Date", &p.license_issue),
                ("License Expiry Date", &p.license_expiry),
            ];
            for (label, value) in optional {
                if let Some(v) = value {
                    writeln!(out, "  {}: {}", label, v)?;
                }
            }
        }

        let s = &self.summary;
        writeln!(out, "\n[Summary]")?;
        writeln!(out, "  Flights: {}", s.flights)?;
        for (label, d) in [
            ("Total", &s.total),
            ("PIC", &s.pic),
            ("SIC", &s.sic),
            ("IFR", &s.ifr),
            ("Day", &s.day),
            ("Night", &s.night),
        ] {
            writeln!(out, "  {:<6} {}", label, d.hhmm)?;
        }

        let b = &self.breakdown;
        writeln!(out, "\n[Flight Hours Breakdown]")?;
        writeln!(
            out,
            "  PIC {} | SIC {} | IFR {} | VFR {}",
            format_duration(b.pic),
            format_duration(b.sic),
            format_duration(b.ifr),
            format_duration(b.vfr)
        )?;

        writeln!(out, "\n[Last Flight]")?;
        match &self.last_flight {
            None => writeln!(out, "  No flights found for this pilot.")?,
            Some(f) => {
                writeln!(out, "  Date: {}", dash(&f.date))?;
                writeln!(
                    out,
                    "  Aircraft: {} — {}",
                    dash(&f.aircraft_model),
                    dash(&f.aircraft_reg)
                )?;
                writeln!(out, "  Route: {} → {}", dash(&f.route_from), dash(&f.route_to))?;
                writeln!(
                    out,
                    "  Time: {} | {} • {} • {}",
                    f.total,
                    if f.ifr { "IFR" } else { "VFR" },
                    if f.night { "Night" } else { "Day" },
                    f.role.label()
                )?;
                if let Some(a) = &f.approaches {
                    match &a.kind {
                        Some(kind) => writeln!(out, "  Approaches: {} ({})", a.count, kind)?,
                        None => writeln!(out, "  Approaches: {}", a.count)?,
                    }
                }
            }
        }

        let d = &self.diagnostics;
        if d.blank_rows > 0 || d.unattributed_rows > 0 {
            writeln!(
                out,
                "\n(skipped {} blank rows; {} rows without a pilot name)",
                d.blank_rows, d.unattributed_rows
            )?;
        }
        Ok(())
    }
}

/// Per-pilot totals for a whole logbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotsReport {
    pub source: String,
    pub pilots: BTreeMap<String, SummaryView>,
    pub unattributed_rows: usize,
}

impl PilotsReport {
    pub fn build(source: &str, sheet: &Sheet, index: &FieldIndex) -> Self {
        let groups = group_by_pilot(sheet.rows(), index);
        Self {
            source: source.to_string(),
            pilots: groups
                .pilots
                .iter()
                .map(|(name, s)| (name.clone(), SummaryView::from(s)))
                .collect(),
            unattributed_rows: groups.unattributed,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==== {} ====", self.source);
        if self.pilots.is_empty() {
            let _ = writeln!(out, "No pilots found.");
        } else {
            let _ = writeln!(out, "Pilots found: {}", self.pilots.len());
        }
        for (name, s) in &self.pilots {
            let _ = writeln!(
                out,
                "  {}: {} flights, total {}, PIC {}, SIC {}",
                name, s.flights, s.total.hhmm, s.pic.hhmm, s.sic.hhmm
            );
        }
        if self.unattributed_rows > 0 {
            let _ = writeln!(out, "  (no pilot name: {} rows)", self.unattributed_rows);
        }
        out
    }
}

/// How each field was located in a sheet's header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadersReport {
    pub source: String,
    pub headers: Vec<String>,
    pub resolved: BTreeMap<SemanticField, Resolution>,
    pub unresolved: Vec<SemanticField>,
}

impl HeadersReport {
    pub fn build(source: &str, sheet: &Sheet, index: &FieldIndex) -> Self {
        Self {
            source: source.to_string(),
            headers: sheet.headers().to_vec(),
            resolved: index.iter().map(|(f, r)| (*f, r.clone())).collect(),
            unresolved: index.unresolved(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==== {} ====", self.source);
        for (field, r) in &self.resolved {
            let _ = writeln!(
                out,
                "  {:<15} col {:>2}  {:?}  ({:?} on {:?})",
                field.as_str(),
                r.column,
                r.header,
                r.rule,
                r.matched
            );
        }
        if !self.unresolved.is_empty() {
            let names: Vec<&str> = self.unresolved.iter().map(|f| f.as_str()).collect();
            let _ = writeln!(out, "  not found: {}", names.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderCatalog;

    fn logbook() -> Sheet {
        let headers = [
            "Flight Date",
            "Pilot Full Name",
            "Aircraft Make/Model",
            "Aircraft Registration",
            "Route From (ICAO)",
            "Route To (ICAO)",
            "Total Flight Time (HH:MM)",
            "PIC Time (HH:MM)",
            "SIC Time (HH:MM)",
            "IFR Time (HH:MM)",
            "Night Time (HH:MM)",
            "Solo Time (HH:MM)",
            "Approach Count",
            "Approach Type",
            "License Number",
        ];
        let rows: &[&[&str]] = &[
            &["2023-01-01", "Bob", "C172", "N1", "KSFO", "KOAK", "01:00", "01:00", "", "", "", "", "", "", "B-1"],
            &["2023-03-01", "Alice", "A320", "CC-1", "SCEL", "SAEZ", "02:00", "", "02:00", "01:00", "00:30", "", "2", "ILS", "A-1"],
            &["", "", "", "", "", "", "", "", "", "", "", "", "", "", ""],
            &["2023-02-01", "Alice", "PA28", "CC-2", "SCEL", "SCEL", "01:30", "01:30", "", "", "", "00:30", "", "", "A-1"],
        ];
        Sheet::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().copied().collect()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_selection() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let groups = group_by_pilot(sheet.rows(), &idx);
        assert_eq!(
            Selection::default_for(&groups, Some("Bob")),
            Selection::Pilot("Bob".into())
        );
        assert_eq!(
            Selection::default_for(&groups, Some("Nobody")),
            Selection::Pilot("Alice".into())
        );
        assert_eq!(
            Selection::default_for(&PilotGroups::default(), None),
            Selection::All
        );
    }

    #[test]
    fn test_report_for_pilot() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let report = LogbookReport::build("log.csv", &sheet, &idx, &Selection::Pilot("Alice".into()));

        assert_eq!(report.pilots, vec!["Alice", "Bob"]);
        assert_eq!(report.summary.flights, 2);
        assert_eq!(report.summary.total.hhmm, "03:30");
        assert_eq!(report.summary.pic.minutes, 90.0);
        assert_eq!(report.summary.sic.hhmm, "02:00");
        assert_eq!(report.breakdown.ifr, 60.0);
        assert_eq!(report.diagnostics.blank_rows, 1);
        assert_eq!(report.diagnostics.unattributed_rows, 0);

        let profile = report.profile.as_ref().unwrap();
        assert_eq!(profile.license_number.as_deref(), Some("A-1"));

        let last = report.last_flight.as_ref().unwrap();
        assert_eq!(last.date.as_deref(), Some("2023-03-01"));
        assert_eq!(last.aircraft_model.as_deref(), Some("A320"));
        assert_eq!(last.total, "02:00");
        assert!(last.ifr);
        assert!(last.night);
        assert_eq!(last.role, Role::Sic);
        assert_eq!(
            last.approaches,
            Some(Approaches {
                count: 2,
                kind: Some("ILS".into())
            })
        );
        assert_eq!(last.row["Route To (ICAO)"], "SAEZ");
    }

    #[test]
    fn test_solo_and_vfr_last_flight() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let row = &sheet.rows()[3];
        let view = LastFlightView::new(&sheet, &idx, row).unwrap();
        assert_eq!(view.role, Role::Solo);
        assert!(!view.ifr);
        assert!(!view.night);
        assert_eq!(view.approaches, None);
    }

    #[test]
    fn test_report_without_flights() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let report = LogbookReport::build("log.csv", &sheet, &idx, &Selection::Pilot("Carol".into()));
        assert_eq!(report.summary.flights, 0);
        assert_eq!(report.summary.total.hhmm, "00:00");
        assert!(report.profile.is_none());
        assert!(report.last_flight.is_none());
        assert!(report
            .render_text()
            .contains("No flights found for this pilot."));
    }

    #[test]
    fn test_text_rendering() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let text = LogbookReport::build("log.csv", &sheet, &idx, &Selection::All).render_text();
        assert!(text.contains("Pilot: (all rows)"));
        assert!(text.contains("Flights: 3"));
        assert!(text.contains("Total  04:30"));
        assert!(text.contains("Aircraft: A320 — CC-1"));
        assert!(text.contains("Approaches: 2 (ILS)"));

        let pilots = PilotsReport::build("log.csv", &sheet, &idx).render_text();
        assert!(pilots.contains("Pilots found: 2"));
        assert!(pilots.contains("Alice: 2 flights, total 03:30, PIC 01:30, SIC 02:00"));

        let headers = HeadersReport::build("log.csv", &sheet, &idx);
        assert!(headers.unresolved.contains(&SemanticField::Day));
        assert!(headers.render_text().contains("not found:"));
    }

    #[test]
    fn test_json_output_shape() {
        let sheet = logbook();
        let idx = sheet.field_index(&HeaderCatalog::default());
        let report = LogbookReport::build("log.csv", &sheet, &idx, &Selection::Pilot("Bob".into()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["pic"]["hhmm"], "01:00");
        assert_eq!(json["summary"]["pic"]["minutes"], 60.0);
        assert_eq!(json["last_flight"]["role"], "PIC");
        assert_eq!(json["diagnostics"]["unresolved_fields"][0], "DAY");
    }
}
