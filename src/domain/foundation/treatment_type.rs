//! Treatment classification enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of treatment plan a patient is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentType {
    #[serde(rename = "IUI")]
    Iui,
    #[serde(rename = "IVF")]
    Ivf,
    Consultation,
    Other,
}

impl TreatmentType {
    /// Parses a backend value, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("iui") {
            Some(TreatmentType::Iui)
        } else if raw.eq_ignore_ascii_case("ivf") {
            Some(TreatmentType::Ivf)
        } else if raw.eq_ignore_ascii_case("consultation") {
            Some(TreatmentType::Consultation)
        } else if raw.eq_ignore_ascii_case("other") {
            Some(TreatmentType::Other)
        } else {
            None
        }
    }

    /// Narrows to a cycle type; only IUI and IVF treatments run cycles.
    pub fn cycle_type(&self) -> Option<CycleType> {
        match self {
            TreatmentType::Iui => Some(CycleType::Iui),
            TreatmentType::Ivf => Some(CycleType::Ivf),
            TreatmentType::Consultation | TreatmentType::Other => None,
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TreatmentType::Iui => "IUI",
            TreatmentType::Ivf => "IVF",
            TreatmentType::Consultation => "Consultation",
            TreatmentType::Other => "Other",
        };
        f.write_str(s)
    }
}

/// Treatment type of a cycle, as far as it can be inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleType {
    #[serde(rename = "IUI")]
    Iui,
    #[serde(rename = "IVF")]
    Ivf,
}

impl CycleType {
    /// Backend code for this type.
    pub fn code(&self) -> &'static str {
        match self {
            CycleType::Iui => "IUI",
            CycleType::Ivf => "IVF",
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
