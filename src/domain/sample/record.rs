//! Sample records as fetched from the clinic API.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::readiness::is_quality_checked_status;
use crate::domain::foundation::{CycleId, PatientId, SampleId};

/// Kind of lab sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    #[serde(alias = "Sperm", alias = "SPERM")]
    Sperm,
    #[serde(alias = "Oocyte", alias = "OOCYTE")]
    Oocyte,
}

impl SampleKind {
    /// Value of the `type` query parameter on the samples endpoint.
    pub fn query_value(&self) -> &'static str {
        match self {
            SampleKind::Sperm => "Sperm",
            SampleKind::Oocyte => "Oocyte",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::Sperm => f.write_str("sperm"),
            SampleKind::Oocyte => f.write_str("oocyte"),
        }
    }
}

/// A lab sample belonging to a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: SampleId,
    pub patient_id: PatientId,
    pub sample_type: SampleKind,

    /// Free-text lifecycle label (Collected, QualityChecked, Frozen, ...).
    #[serde(default)]
    pub status: Option<String>,

    /// Set once the lab marks the sample eligible for fertilization.
    #[serde(default)]
    pub can_fertilize: bool,

    #[serde(default)]
    pub treatment_cycle_id: Option<CycleId>,
}

impl Sample {
    pub fn new(id: SampleId, patient_id: PatientId, sample_type: SampleKind) -> Self {
        Self {
            id,
            patient_id,
            sample_type,
            status: None,
            can_fertilize: false,
            treatment_cycle_id: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn for_cycle(mut self, cycle_id: CycleId) -> Self {
        self.treatment_cycle_id = Some(cycle_id);
        self
    }

    /// True when the lab has passed this sample.
    pub fn is_quality_checked(&self) -> bool {
        self.status.as_deref().is_some_and(is_quality_checked_status)
    }
}
