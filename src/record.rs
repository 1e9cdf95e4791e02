//! Typed view of a logbook row, built from a [`RawRow`] and a [`FieldIndex`].

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::cell::{display_date, normalize_duration, parse_flight_date, CellValue};
use crate::header::{FieldIndex, SemanticField};
use crate::sheet::RawRow;

/// One flight. Duration fields are `None` when the sheet has no such column
/// and `Some(0.0)` when the column exists but the cell is blank or unreadable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightRecord {
    pub pilot_name: Option<String>,
    pub flight_date: Option<NaiveDateTime>,
    pub aircraft_model: Option<String>,
    pub aircraft_reg: Option<String>,
    pub route_from: Option<String>,
    pub route_to: Option<String>,
    pub approach_count: Option<u32>,
    pub approach_type: Option<String>,

    pub total: Option<f64>,
    pub pic: Option<f64>,
    pub sic: Option<f64>,
    pub ifr: Option<f64>,
    pub vfr: Option<f64>,
    pub day: Option<f64>,
    pub night: Option<f64>,
    pub solo: Option<f64>,

    pub license_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
    pub license_type: Option<String>,
    pub license_issue: Option<String>,
    pub license_expiry: Option<String>,
}

impl FlightRecord {
    /// `None` for a fully blank row.
    pub fn from_row(row: &RawRow, index: &FieldIndex) -> Option<Self> {
        if row.is_blank() {
            return None;
        }
        let minutes = |f| row.field(index, f).map(normalize_duration);
        let text = |f| row.field(index, f).and_then(CellValue::non_blank_display);
        let date_text = |f| row.field(index, f).and_then(display_date);

        Some(Self {
            pilot_name: pilot_key(row, index),
            flight_date: row.field(index, SemanticField::FlightDate).and_then(parse_flight_date),
            aircraft_model: text(SemanticField::AircraftModel),
            aircraft_reg: text(SemanticField::AircraftReg),
            route_from: text(SemanticField::RouteFrom),
            route_to: text(SemanticField::RouteTo),
            approach_count: row
                .field(index, SemanticField::ApproachCount)
                .filter(|c| !c.is_blank())
                .map(|c| normalize_duration(c).max(0.0).round() as u32),
            approach_type: text(SemanticField::ApproachType),

            total: minutes(SemanticField::Total),
            pic: minutes(SemanticField::Pic),
            sic: minutes(SemanticField::Sic),
            ifr: minutes(SemanticField::Ifr),
            vfr: minutes(SemanticField::Vfr),
            day: minutes(SemanticField::Day),
            night: minutes(SemanticField::Night),
            solo: minutes(SemanticField::SoloTime),

            license_number: text(SemanticField::LicenseNumber),
            nationality: text(SemanticField::Nationality),
            date_of_birth: date_text(SemanticField::Dob),
            license_type: text(SemanticField::LicenseType),
            license_issue: date_text(SemanticField::LicenseIssue),
            license_expiry: date_text(SemanticField::LicenseExpiry),
        })
    }
}

/// Trimmed pilot name, `None` when the field is missing or blank.
pub fn pilot_key(row: &RawRow, index: &FieldIndex) -> Option<String> {
    row.field(index, SemanticField::PilotName)
        .and_then(CellValue::non_blank_display)
}

/// Identity and licence details shown alongside a pilot's totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PilotProfile {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
    pub license_type: Option<String>,
    pub license_issue: Option<String>,
    pub license_expiry: Option<String>,
}

impl PilotProfile {
    /// Taken from the first non-blank row of the selection.
    pub fn from_rows<'a, I>(rows: I, index: &FieldIndex) -> Option<Self>
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let first = rows
            .into_iter()
            .find_map(|row| FlightRecord::from_row(row, index))?;
        Some(Self {
            name: first.pilot_name,
            license_number: first.license_number,
            nationality: first.nationality,
            date_of_birth: first.date_of_birth,
            license_type: first.license_type,
            license_issue: first.license_issue,
            license_expiry: first.license_expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderCatalog;

    fn index(headers: &[&str]) -> FieldIndex {
        FieldIndex::resolve(headers, &HeaderCatalog::default())
    }

    #[test]
    fn test_blank_row_has_no_record() {
        let idx = index(&["PIC", "Pilot Name"]);
        let row: RawRow = ["", "  "].into_iter().collect();
        assert_eq!(FlightRecord::from_row(&row, &idx), None);
    }

    #[test]
    fn test_missing_vs_empty_fields() {
        let idx = index(&["PIC Time", "SIC Time", "Pilot Name"]);
        let row: RawRow = ["01:30", "", " Alice "].into_iter().collect();
        let rec = FlightRecord::from_row(&row, &idx).unwrap();
        assert_eq!(rec.pic, Some(90.0));
        assert_eq!(rec.sic, Some(0.0));
        assert_eq!(rec.ifr, None);
        assert_eq!(rec.pilot_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_descriptive_fields() {
        let idx = index(&[
            "Flight Date",
            "Aircraft Make/Model",
            "Aircraft Registration",
            "Route From (ICAO)",
            "Route To (ICAO)",
            "Approach Count",
            "Approach Type",
            "License Expiry Date",
        ]);
        let row: RawRow = [
            "2023-06-01",
            "C172",
            "N123AB",
            "KSFO",
            "KOAK",
            "2",
            "ILS",
            "Tue Dec 31 2024 00:00:00 GMT+0000",
        ]
        .into_iter()
        .collect();
        let rec = FlightRecord::from_row(&row, &idx).unwrap();
        assert_eq!(rec.flight_date.unwrap().to_string(), "2023-06-01 00:00:00");
        assert_eq!(rec.aircraft_model.as_deref(), Some("C172"));
        assert_eq!(rec.aircraft_reg.as_deref(), Some("N123AB"));
        assert_eq!(rec.route_from.as_deref(), Some("KSFO"));
        assert_eq!(rec.route_to.as_deref(), Some("KOAK"));
        assert_eq!(rec.approach_count, Some(2));
        assert_eq!(rec.approach_type.as_deref(), Some("ILS"));
        assert_eq!(rec.license_expiry.as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn test_profile_from_first_non_blank_row() {
        let idx = index(&["Pilot Full Name", "License Number", "Nationality"]);
        let rows: Vec<RawRow> = vec![
            ["", "", ""].into_iter().collect(),
            ["Alice", "ATPL-1", "CL"].into_iter().collect(),
            ["Alice", "ATPL-2", "AR"].into_iter().collect(),
        ];
        let profile = PilotProfile::from_rows(&rows, &idx).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Alice"));
        assert_eq!(profile.license_number.as_deref(), Some("ATPL-1"));
        assert_eq!(profile.nationality.as_deref(), Some("CL"));
        assert_eq!(profile.date_of_birth, None);

        let empty: Vec<RawRow> = Vec::new();
        assert_eq!(PilotProfile::from_rows(&empty, &idx), None);
    }
}
