// src/header/mod.rs
pub mod resolve;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use resolve::{resolve_field, FieldIndex, MatchRule, Resolution};

/// A flight-log attribute, independent of how a given spreadsheet spells its
/// column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticField {
    Total,
    Pic,
    Sic,
    Ifr,
    Day,
    Night,
    Vfr,
    PilotName,
    FlightDate,
    AircraftModel,
    AircraftReg,
    RouteFrom,
    RouteTo,
    ApproachCount,
    ApproachType,
    SoloTime,
    LicenseNumber,
    Nationality,
    Dob,
    LicenseType,
    LicenseIssue,
    LicenseExpiry,
}

impl SemanticField {
    pub const ALL: [SemanticField; 22] = [
        SemanticField::Total,
        SemanticField::Pic,
        SemanticField::Sic,
        SemanticField::Ifr,
        SemanticField::Day,
        SemanticField::Night,
        SemanticField::Vfr,
        SemanticField::PilotName,
        SemanticField::FlightDate,
        SemanticField::AircraftModel,
        SemanticField::AircraftReg,
        SemanticField::RouteFrom,
        SemanticField::RouteTo,
        SemanticField::ApproachCount,
        SemanticField::ApproachType,
        SemanticField::SoloTime,
        SemanticField::LicenseNumber,
        SemanticField::Nationality,
        SemanticField::Dob,
        SemanticField::LicenseType,
        SemanticField::LicenseIssue,
        SemanticField::LicenseExpiry,
    ];

    /// Built-in header spellings, most specific first.
    pub fn variants(self) -> &'static [&'static str] {
        use SemanticField::*;
        match self {
            Total => &[
                "Total Flight Time (HH:MM)",
                "Total Time (HH:MM)",
                "Total Flight Time",
                "Total",
            ],
            Pic => &["PIC Time (HH:MM)", "PIC Time", "PIC"],
            Sic => &["SIC Time (HH:MM)", "SIC Time", "SIC"],
            Ifr => &["IFR Time (HH:MM)", "IFR Time", "IFR"],
            Day => &["Day Time (HH:MM)", "Day Time", "Day"],
            Night => &["Night Time (HH:MM)", "Night Time", "Night"],
            Vfr => &["VFR Time (HH:MM)", "VFR Time", "VFR", "VFR/Other"],
            PilotName => &["Pilot Full Name", "Pilot Name", "Name", "Full Name"],
            FlightDate => &["Flight Date", "Date of Flight", "Date"],
            AircraftModel => &["Aircraft Make/Model", "Make/Model", "Aircraft Model", "Aircraft Type"],
            AircraftReg => &["Aircraft Registration", "Registration", "Tail Number"],
            RouteFrom => &["Route From (ICAO)", "Route From", "Departure"],
            RouteTo => &["Route To (ICAO)", "Route To", "Destination", "Arrival"],
            ApproachCount => &["Approach Count", "Approaches"],
            ApproachType => &["Approach Type"],
            SoloTime => &["Solo Time (HH:MM)", "Solo Time", "Solo"],
            LicenseNumber => &["License Number", "Licence Number", "License No"],
            Nationality => &["Nationality"],
            Dob => &["Date of Birth", "DOB", "Birth Date"],
            LicenseType => &["License Type", "Licence Type"],
            LicenseIssue => &["License Issue Date", "Licence Issue Date", "Issue Date"],
            LicenseExpiry => &["License Expiry Date", "Licence Expiry Date", "Expiry Date"],
        }
    }

    /// Short fragments tried last, after every variant failed as a substring.
    pub fn keywords(self) -> &'static [&'static str] {
        use SemanticField::*;
        match self {
            Total => &["TOTAL"],
            Pic => &["PIC"],
            Sic => &["SIC"],
            Ifr => &["IFR"],
            Day => &["DAY"],
            Night => &["NIGHT"],
            Vfr => &["VFR"],
            PilotName => &["PILOT", "NAME"],
            FlightDate => &["DATE"],
            AircraftModel => &["MODEL"],
            AircraftReg => &["REG"],
            SoloTime => &["SOLO"],
            RouteFrom | RouteTo | ApproachCount | ApproachType | LicenseNumber | Nationality
            | Dob | LicenseType | LicenseIssue | LicenseExpiry => &[],
        }
    }

    /// Duration categories, summed by the aggregator.
    pub fn is_duration(self) -> bool {
        use SemanticField::*;
        matches!(self, Total | Pic | Sic | Ifr | Day | Night | Vfr | SoloTime)
    }

    pub fn as_str(self) -> &'static str {
        use SemanticField::*;
        match self {
            Total => "TOTAL",
            Pic => "PIC",
            Sic => "SIC",
            Ifr => "IFR",
            Day => "DAY",
            Night => "NIGHT",
            Vfr => "VFR",
            PilotName => "PILOT_NAME",
            FlightDate => "FLIGHT_DATE",
            AircraftModel => "AIRCRAFT_MODEL",
            AircraftReg => "AIRCRAFT_REG",
            RouteFrom => "ROUTE_FROM",
            RouteTo => "ROUTE_TO",
            ApproachCount => "APPROACH_COUNT",
            ApproachType => "APPROACH_TYPE",
            SoloTime => "SOLO_TIME",
            LicenseNumber => "LICENSE_NUMBER",
            Nationality => "NATIONALITY",
            Dob => "DOB",
            LicenseType => "LICENSE_TYPE",
            LicenseIssue => "LICENSE_ISSUE",
            LicenseExpiry => "LICENSE_EXPIRY",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered candidate headers for one field: built-in spellings followed by any
/// configured extras. Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderVariantSet {
    pub field: SemanticField,
    pub variants: Vec<String>,
    pub keywords: Vec<String>,
}

impl HeaderVariantSet {
    pub fn builtin(field: SemanticField) -> Self {
        Self {
            field,
            variants: field.variants().iter().map(|s| s.to_string()).collect(),
            keywords: field.keywords().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for v in extra {
            let v = v.into();
            if !v.trim().is_empty() && !self.variants.contains(&v) {
                self.variants.push(v);
            }
        }
        self
    }
}

/// Variant sets for every [`SemanticField`], in [`SemanticField::ALL`] order.
#[derive(Debug, Clone)]
pub struct HeaderCatalog {
    sets: Vec<HeaderVariantSet>,
}

impl Default for HeaderCatalog {
    fn default() -> Self {
        Self {
            sets: SemanticField::ALL
                .iter()
                .map(|f| HeaderVariantSet::builtin(*f))
                .collect(),
        }
    }
}

impl HeaderCatalog {
    /// Built-in catalog with extra spellings appended per field.
    pub fn with_extras<'a, I>(extras: I) -> Self
    where
        I: IntoIterator<Item = (&'a SemanticField, &'a Vec<String>)>,
    {
        let mut catalog = Self::default();
        for (field, extra) in extras {
            if let Some(set) = catalog.sets.iter_mut().find(|s| s.field == *field) {
                *set = set.clone().with_extra(extra.iter().cloned());
            }
        }
        catalog
    }

    pub fn get(&self, field: SemanticField) -> &HeaderVariantSet {
        // `sets` always holds one entry per field in `ALL` order
        &self.sets[field as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderVariantSet> {
        self.sets.iter()
    }
}
