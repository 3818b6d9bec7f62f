//! Cycle and Treatment records as fetched from the clinic API.
//!
//! These are read-only snapshots. Several fields are deliberately kept in
//! their raw, weakly-typed form (`treatment_type`, `step_type`,
//! `current_step`, `status`) because the backend populates them
//! inconsistently; interpretation happens in the inference and status
//! modules, never at decode time.

use serde::{Deserialize, Serialize};

use super::notes::CycleNotes;
use super::status::{normalize_status, RawStatus};
use crate::domain::foundation::{
    lenient_optional, CycleId, CycleState, DoctorId, PatientId, Timestamp, TreatmentId,
    TreatmentType,
};

/// One treatment cycle within a treatment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: CycleId,
    pub treatment_id: TreatmentId,
    pub patient_id: PatientId,

    /// 1-based position within the treatment.
    #[serde(default)]
    pub cycle_number: Option<u32>,

    #[serde(default)]
    pub cycle_name: Option<String>,

    /// Raw treatment type ("IUI", "IVF", or whatever the backend sent).
    #[serde(default)]
    pub treatment_type: Option<String>,

    /// Step hint such as "IVF_OPU" or "IUI_PROCEDURE".
    #[serde(default)]
    pub step_type: Option<String>,

    /// Fine-grained step code such as "step4_opu".
    #[serde(default)]
    pub current_step: Option<String>,

    #[serde(default)]
    pub status: Option<RawStatus>,

    #[serde(default, deserialize_with = "lenient_optional")]
    pub start_date: Option<Timestamp>,

    #[serde(default, deserialize_with = "lenient_optional")]
    pub end_date: Option<Timestamp>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Cycle {
    /// Creates a bare cycle with every optional field empty.
    pub fn new(id: CycleId, treatment_id: TreatmentId, patient_id: PatientId) -> Self {
        Self {
            id,
            treatment_id,
            patient_id,
            cycle_number: None,
            cycle_name: None,
            treatment_type: None,
            step_type: None,
            current_step: None,
            status: None,
            start_date: None,
            end_date: None,
            notes: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<RawStatus>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_cycle_number(mut self, number: u32) -> Self {
        self.cycle_number = Some(number);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.cycle_name = Some(name.into());
        self
    }

    pub fn with_treatment_type(mut self, treatment_type: impl Into<String>) -> Self {
        self.treatment_type = Some(treatment_type.into());
        self
    }

    pub fn with_step_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = Some(step_type.into());
        self
    }

    pub fn with_current_step(mut self, current_step: impl Into<String>) -> Self {
        self.current_step = Some(current_step.into());
        self
    }

    pub fn with_start_date(mut self, start_date: Timestamp) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Canonical state, derived from `status` alone.
    ///
    /// A start date does not make a cycle in progress; only the status does.
    pub fn state(&self) -> CycleState {
        normalize_status(self.status.as_ref())
    }

    /// Structured view of the notes field.
    pub fn parsed_notes(&self) -> CycleNotes {
        self.notes
            .as_deref()
            .map(CycleNotes::parse)
            .unwrap_or_default()
    }
}

/// Parent treatment plan of a set of cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: TreatmentId,
    pub patient_id: PatientId,

    #[serde(default)]
    pub doctor_id: Option<DoctorId>,

    /// Raw treatment type; parse with [`Treatment::parsed_type`].
    #[serde(default)]
    pub treatment_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_optional")]
    pub created_at: Option<Timestamp>,

    #[serde(default, deserialize_with = "lenient_optional")]
    pub updated_at: Option<Timestamp>,
}

impl Treatment {
    pub fn new(id: TreatmentId, patient_id: PatientId) -> Self {
        Self {
            id,
            patient_id,
            doctor_id: None,
            treatment_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_treatment_type(mut self, treatment_type: impl Into<String>) -> Self {
        self.treatment_type = Some(treatment_type.into());
        self
    }

    pub fn with_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    /// Treatment type parsed case-insensitively, if recognised.
    pub fn parsed_type(&self) -> Option<TreatmentType> {
        self.treatment_type.as_deref().and_then(TreatmentType::parse)
    }
}
