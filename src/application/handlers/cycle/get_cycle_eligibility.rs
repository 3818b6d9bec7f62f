//! GetCycleEligibilityHandler - Query handler for a cycle's action flags.
//!
//! Fetches the cycle, then its parent treatment and sibling cycles for type
//! inference, then (only at the IVF collection step) the patient's sperm and
//! oocyte samples. Related-record failures degrade to "unknown" with a
//! warning; only a failure to fetch the cycle itself is an error.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::cycle::{
    infer_treatment_type, is_at_collection_step, resolve_eligibility_in, Cycle, CycleEligibility,
    Treatment, TypeContext,
};
use crate::domain::foundation::{CycleId, CycleState, CycleType, DomainError, ErrorCode};
use crate::domain::sample::{SampleKind, SampleReadiness};
use crate::ports::{ClinicApi, ClinicApiError};

/// Query for the eligibility of one cycle.
#[derive(Debug, Clone)]
pub struct GetCycleEligibilityQuery {
    pub cycle_id: CycleId,
}

/// Everything the portal needs to render a cycle's action buttons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEligibilityView {
    pub cycle: Cycle,
    pub state: CycleState,
    /// Display label of `state`, e.g. "In Progress".
    pub label: String,
    pub cycle_type: Option<CycleType>,
    pub eligibility: CycleEligibility,
    pub readiness: SampleReadiness,
}

/// Error type for the eligibility query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetCycleEligibilityError {
    #[error("Cycle not found: {0}")]
    NotFound(CycleId),

    #[error(transparent)]
    Api(#[from] ClinicApiError),
}

impl From<GetCycleEligibilityError> for DomainError {
    fn from(err: GetCycleEligibilityError) -> Self {
        match err {
            GetCycleEligibilityError::NotFound(id) => {
                DomainError::new(ErrorCode::CycleNotFound, format!("Cycle not found: {}", id))
                    .with_detail("cycle_id", id.to_string())
            }
            GetCycleEligibilityError::Api(api) => api.into(),
        }
    }
}

/// Handler for the eligibility query.
pub struct GetCycleEligibilityHandler {
    api: Arc<dyn ClinicApi>,
}

impl GetCycleEligibilityHandler {
    pub fn new(api: Arc<dyn ClinicApi>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self), fields(cycle_id = %query.cycle_id))]
    pub async fn handle(
        &self,
        query: GetCycleEligibilityQuery,
    ) -> Result<CycleEligibilityView, GetCycleEligibilityError> {
        load_view(self.api.as_ref(), &query.cycle_id)
            .await?
            .ok_or(GetCycleEligibilityError::NotFound(query.cycle_id))
    }
}

/// Fetches a cycle and its related records and resolves its eligibility.
///
/// Returns `Ok(None)` when the cycle does not exist.
pub(crate) async fn load_view(
    api: &dyn ClinicApi,
    cycle_id: &CycleId,
) -> Result<Option<CycleEligibilityView>, ClinicApiError> {
    let cycle = match api.get_cycle(cycle_id).await? {
        Some(cycle) => cycle,
        None => return Ok(None),
    };

    let (parent, siblings) = futures::join!(
        api.get_treatment(&cycle.treatment_id),
        api.list_cycles_for_treatment(&cycle.treatment_id),
    );
    let parent = degrade_treatment(&cycle, parent);
    let siblings = siblings.unwrap_or_else(|e| {
        tracing::warn!(cycle_id = %cycle.id, error = %e, "Sibling cycles unavailable; skipping sibling inference");
        Vec::new()
    });

    let ctx = TypeContext::new(parent.as_ref(), &siblings);
    let readiness = if is_at_collection_step(&cycle, infer_treatment_type(&cycle, &ctx)) {
        load_readiness(api, &cycle).await
    } else {
        SampleReadiness::not_required()
    };

    let eligibility = resolve_eligibility_in(&cycle, &ctx, &readiness);
    tracing::debug!(
        cycle_id = %cycle.id,
        state = ?eligibility.state,
        cycle_type = ?eligibility.cycle_type,
        can_start = eligibility.can_start,
        can_complete = eligibility.can_complete,
        can_cancel = eligibility.can_cancel,
        "Resolved cycle eligibility"
    );

    Ok(Some(CycleEligibilityView {
        state: eligibility.state,
        label: eligibility.state.label().to_string(),
        cycle_type: eligibility.cycle_type,
        eligibility,
        readiness,
        cycle,
    }))
}

fn degrade_treatment(
    cycle: &Cycle,
    result: Result<Option<Treatment>, ClinicApiError>,
) -> Option<Treatment> {
    match result {
        Ok(Some(treatment)) => Some(treatment),
        Ok(None) => {
            tracing::warn!(cycle_id = %cycle.id, treatment_id = %cycle.treatment_id, "Parent treatment not found");
            None
        }
        Err(e) => {
            tracing::warn!(cycle_id = %cycle.id, error = %e, "Parent treatment unavailable; skipping treatment inference");
            None
        }
    }
}

/// Samples are fetched per kind; a failed fetch counts as "no samples known".
async fn load_readiness(api: &dyn ClinicApi, cycle: &Cycle) -> SampleReadiness {
    let (sperm, oocyte) = futures::join!(
        api.list_samples(SampleKind::Sperm, &cycle.patient_id),
        api.list_samples(SampleKind::Oocyte, &cycle.patient_id),
    );

    let sperm = sperm.unwrap_or_else(|e| {
        tracing::warn!(cycle_id = %cycle.id, kind = %SampleKind::Sperm, error = %e, "Sample fetch failed");
        Vec::new()
    });
    let oocyte = oocyte.unwrap_or_else(|e| {
        tracing::warn!(cycle_id = %cycle.id, kind = %SampleKind::Oocyte, error = %e, "Sample fetch failed");
        Vec::new()
    });

    SampleReadiness::evaluate(&sperm, &oocyte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryClinicApi;
    use crate::domain::foundation::{PatientId, SampleId, TreatmentId};
    use crate::domain::sample::Sample;

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn cycle(treatment: TreatmentId, patient: PatientId) -> Cycle {
        Cycle::new(CycleId::new(), treatment, patient)
    }

    async fn view(api: Arc<InMemoryClinicApi>, id: CycleId) -> CycleEligibilityView {
        GetCycleEligibilityHandler::new(api)
            .handle(GetCycleEligibilityQuery { cycle_id: id })
            .await
            .unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn missing_cycle_is_not_found() {
        let api = Arc::new(InMemoryClinicApi::new());
        let id = CycleId::new();

        let result = GetCycleEligibilityHandler::new(api)
            .handle(GetCycleEligibilityQuery { cycle_id: id })
            .await;

        assert_eq!(result, Err(GetCycleEligibilityError::NotFound(id)));
    }

    #[tokio::test]
    async fn not_found_converts_to_domain_code() {
        let err: DomainError = GetCycleEligibilityError::NotFound(CycleId::new()).into();
        assert_eq!(err.code, ErrorCode::CycleNotFound);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Type inference context
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn type_is_taken_from_parent_treatment() {
        let api = Arc::new(InMemoryClinicApi::new());
        let treatment = Treatment::new(TreatmentId::new(), PatientId::new()).with_treatment_type("ivf");
        let c = cycle(treatment.id, treatment.patient_id);
        let id = c.id;
        api.insert_treatment(treatment).await;
        api.insert_cycle(c).await;

        let view = view(api, id).await;

        assert_eq!(view.cycle_type, Some(CycleType::Ivf));
    }

    #[tokio::test]
    async fn type_falls_back_to_sibling_when_treatment_unavailable() {
        let api = Arc::new(InMemoryClinicApi::new());
        let treatment = TreatmentId::new();
        let patient = PatientId::new();
        let target = cycle(treatment, patient).with_cycle_number(2);
        let id = target.id;
        api.insert_cycle(cycle(treatment, patient).with_cycle_number(1).with_treatment_type("IUI"))
            .await;
        api.insert_cycle(target).await;
        api.fail_treatment_reads(true).await;

        let view = view(api, id).await;

        assert_eq!(view.cycle_type, Some(CycleType::Iui));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sample readiness
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn collection_step_without_checked_oocyte_blocks_completion() {
        let api = Arc::new(InMemoryClinicApi::new());
        let patient = PatientId::new();
        let c = cycle(TreatmentId::new(), patient)
            .with_treatment_type("IVF")
            .with_step_type("IVF_OPU")
            .with_status("InProgress");
        let id = c.id;
        api.insert_cycle(c).await;
        api.insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Sperm).with_status("QualityChecked"))
            .await;
        api.insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Oocyte).with_status("Collected"))
            .await;

        let view = view(api, id).await;

        assert!(!view.eligibility.can_complete);
        assert!(!view.readiness.ready);
        assert!(view.eligibility.missing_samples.contains(&SampleKind::Oocyte));
        assert_eq!(view.label, "In Progress");
    }

    #[tokio::test]
    async fn sample_fetch_failure_counts_as_no_samples() {
        let api = Arc::new(InMemoryClinicApi::new());
        let c = cycle(TreatmentId::new(), PatientId::new())
            .with_current_step("step4_opu")
            .with_status(2i64);
        let id = c.id;
        api.insert_cycle(c).await;
        api.fail_sample_reads(true).await;

        let view = view(api, id).await;

        assert!(view.readiness.ready);
        assert!(view.eligibility.can_complete);
    }

    #[tokio::test]
    async fn third_iui_cycle_does_not_fetch_samples() {
        let api = Arc::new(InMemoryClinicApi::new());
        let patient = PatientId::new();
        let treatment = Treatment::new(TreatmentId::new(), patient).with_treatment_type("IUI");
        let c = cycle(treatment.id, patient)
            .with_cycle_number(3)
            .with_name("IUI Cycle 3")
            .with_status("InProgress");
        let id = c.id;
        api.insert_treatment(treatment).await;
        api.insert_cycle(c).await;
        api.insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Sperm).with_status("QualityChecked"))
            .await;

        let view = view(api, id).await;

        assert_eq!(view.cycle_type, Some(CycleType::Iui));
        assert!(view.eligibility.can_complete);
        assert_eq!(view.readiness, SampleReadiness::not_required());
    }

    #[tokio::test]
    async fn samples_are_ignored_outside_collection_step() {
        let api = Arc::new(InMemoryClinicApi::new());
        let patient = PatientId::new();
        let c = cycle(TreatmentId::new(), patient)
            .with_current_step("step5_fertilization")
            .with_status("active");
        let id = c.id;
        api.insert_cycle(c).await;
        api.insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Oocyte).with_status("Collected"))
            .await;

        let view = view(api, id).await;

        assert!(view.eligibility.can_complete);
        assert_eq!(view.readiness, SampleReadiness::not_required());
    }
}
