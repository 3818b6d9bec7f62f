//! Clinic API port - the remote REST service that owns cycle data.
//!
//! Reads return snapshots; actions ask the backend to perform a transition.
//! The backend enforces its own business rules and may reject an action even
//! when the local eligibility flags allowed it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::cycle::{Cycle, Treatment};
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, PatientId, Timestamp, TreatmentId};
use crate::domain::sample::{Sample, SampleKind};

/// Port for the clinic REST API.
#[async_trait]
pub trait ClinicApi: Send + Sync {
    /// `GET /treatment-cycles/{id}`; `None` when the cycle does not exist.
    async fn get_cycle(&self, id: &CycleId) -> Result<Option<Cycle>, ClinicApiError>;

    /// `GET /treatments/{id}`; `None` when the treatment does not exist.
    async fn get_treatment(&self, id: &TreatmentId) -> Result<Option<Treatment>, ClinicApiError>;

    /// `GET /treatment-cycles?treatmentId=...`
    async fn list_cycles_for_treatment(
        &self,
        treatment_id: &TreatmentId,
    ) -> Result<Vec<Cycle>, ClinicApiError>;

    /// `GET /samples?type=...&patientId=...`
    async fn list_samples(
        &self,
        kind: SampleKind,
        patient_id: &PatientId,
    ) -> Result<Vec<Sample>, ClinicApiError>;

    /// `POST /treatment-cycles/{id}/start`
    async fn start_cycle(&self, id: &CycleId, request: StartCycleRequest) -> Result<(), ClinicApiError>;

    /// `POST /treatment-cycles/{id}/complete`
    async fn complete_cycle(
        &self,
        id: &CycleId,
        request: CompleteCycleRequest,
    ) -> Result<(), ClinicApiError>;

    /// `POST /treatment-cycles/{id}/cancel`
    async fn cancel_cycle(&self, id: &CycleId, request: CancelCycleRequest) -> Result<(), ClinicApiError>;

    /// `POST /treatment-cycles/{id}/confirm-procedure`
    async fn confirm_procedure(
        &self,
        id: &CycleId,
        request: ConfirmProcedureRequest,
    ) -> Result<(), ClinicApiError>;
}

/// Body of the start action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCycleRequest {
    pub start_date: Timestamp,
}

/// Body of the complete action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCycleRequest {
    pub end_date: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of the cancel action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelCycleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of the IUI procedure confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmProcedureRequest {
    pub procedure_date: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Errors talking to the clinic API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClinicApiError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("not authenticated with the clinic API")]
    Unauthorized,

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("rejected by clinic API ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("clinic API unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ClinicApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Returns true for failures worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClinicApiError::Unavailable(_) | ClinicApiError::Timeout { .. } | ClinicApiError::Network(_)
        )
    }
}

impl From<ClinicApiError> for DomainError {
    fn from(err: ClinicApiError) -> Self {
        let code = if err.is_transient() {
            ErrorCode::UpstreamUnavailable
        } else {
            ErrorCode::UpstreamRejected
        };
        DomainError::new(code, err.to_string())
    }
}
