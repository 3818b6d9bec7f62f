//! End-to-end cycle flows through the public API against the in-memory adapter.

use std::sync::Arc;

use clinic_cycles::adapters::memory::InMemoryClinicApi;
use clinic_cycles::application::{
    CompleteCycleCommand, CompleteCycleHandler, ConfirmProcedureCommand, ConfirmProcedureHandler,
    CycleAction, CycleActionError, GetCycleEligibilityHandler, GetCycleEligibilityQuery,
    PendingActions, StartCycleCommand, StartCycleHandler,
};
use clinic_cycles::domain::cycle::{Cycle, Treatment};
use clinic_cycles::domain::foundation::{
    ActorContext, CycleId, CycleState, CycleType, PatientId, SampleId, TreatmentId, UserId,
};
use clinic_cycles::domain::sample::{Sample, SampleKind};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn actor() -> ActorContext {
    ActorContext::new(UserId::new("dr-integration").unwrap()).with_source("integration-test")
}

struct Portal {
    api: Arc<InMemoryClinicApi>,
    pending: Arc<PendingActions>,
}

impl Portal {
    fn new() -> Self {
        Self {
            api: Arc::new(InMemoryClinicApi::new()),
            pending: Arc::new(PendingActions::new()),
        }
    }

    fn query(&self) -> GetCycleEligibilityHandler {
        GetCycleEligibilityHandler::new(self.api.clone())
    }

    fn start(&self) -> StartCycleHandler {
        StartCycleHandler::new(self.api.clone(), self.pending.clone())
    }

    fn complete(&self) -> CompleteCycleHandler {
        CompleteCycleHandler::new(self.api.clone(), self.pending.clone())
    }

    fn confirm(&self) -> ConfirmProcedureHandler {
        ConfirmProcedureHandler::new(self.api.clone(), self.pending.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IVF collection step
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ivf_retrieval_cycle_waits_for_quality_checked_samples() {
    let portal = Portal::new();
    let patient = PatientId::new();
    let treatment = Treatment::new(TreatmentId::new(), patient).with_treatment_type("IVF");
    let cycle = Cycle::new(CycleId::new(), treatment.id, patient)
        .with_cycle_number(3)
        .with_name("Cycle 3 - OPU")
        .with_status("Scheduled");
    let id = cycle.id;
    portal.api.insert_treatment(treatment).await;
    portal.api.insert_cycle(cycle).await;
    portal
        .api
        .insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Sperm).with_status("Quality Checked"))
        .await;
    portal
        .api
        .insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Oocyte).with_status("Collected"))
        .await;

    // Scheduled: can start, cannot complete.
    let view = portal
        .query()
        .handle(GetCycleEligibilityQuery { cycle_id: id })
        .await
        .unwrap();
    assert_eq!(view.cycle_type, Some(CycleType::Ivf));
    assert!(view.eligibility.can_start);
    assert!(!view.eligibility.can_complete);

    portal
        .start()
        .handle(StartCycleCommand::new(id), actor())
        .await
        .unwrap();

    // In progress but the oocyte sample is not checked yet.
    let err = portal
        .complete()
        .handle(CompleteCycleCommand::new(id), actor())
        .await
        .unwrap_err();
    match err {
        CycleActionError::NotEligible { action, reason } => {
            assert_eq!(action, CycleAction::Complete);
            assert_eq!(reason, "No quality-checked oocyte sample");
        }
        other => panic!("expected NotEligible, got {:?}", other),
    }

    portal
        .api
        .insert_sample(Sample::new(SampleId::new(), patient, SampleKind::Oocyte).with_status("QualityChecked"))
        .await;

    let result = portal
        .complete()
        .handle(CompleteCycleCommand::new(id).with_outcome("12 oocytes"), actor())
        .await
        .unwrap();
    assert_eq!(result.view.as_ref().unwrap().state, CycleState::Completed);
    assert!(!result.view.as_ref().unwrap().eligibility.can_start);
    assert!(!result.view.as_ref().unwrap().eligibility.can_complete);
    assert!(!result.view.as_ref().unwrap().eligibility.can_cancel);
}

// ─────────────────────────────────────────────────────────────────────────────
// IUI procedure
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn iui_cycle_typed_from_sibling_goes_through_procedure() {
    let portal = Portal::new();
    let patient = PatientId::new();
    let treatment = TreatmentId::new();
    portal
        .api
        .insert_cycle(Cycle::new(CycleId::new(), treatment, patient).with_cycle_number(1).with_name("IUI Cycle 1"))
        .await;
    let cycle = Cycle::new(CycleId::new(), treatment, patient)
        .with_cycle_number(2)
        .with_current_step("step4_iui_procedure")
        .with_status("Pending");
    let id = cycle.id;
    portal.api.insert_cycle(cycle).await;

    let started = portal
        .start()
        .handle(StartCycleCommand::new(id), actor())
        .await
        .unwrap();
    assert_eq!(started.view.as_ref().unwrap().cycle_type, Some(CycleType::Iui));
    assert!(started.view.as_ref().unwrap().eligibility.is_at_iui_procedure_step);
    assert!(!started.view.as_ref().unwrap().eligibility.is_at_fertilization_step);

    let confirmed = portal
        .confirm()
        .handle(ConfirmProcedureCommand::new(id), actor())
        .await
        .unwrap();
    assert!(!confirmed.view.as_ref().unwrap().eligibility.is_at_iui_procedure_step);
    assert_eq!(confirmed.view.as_ref().unwrap().state, CycleState::InProgress);

    // A second confirmation is refused locally.
    let err = portal
        .confirm()
        .handle(ConfirmProcedureCommand::new(id), actor())
        .await
        .unwrap_err();
    assert!(matches!(err, CycleActionError::NotEligible { .. }));
    assert_eq!(portal.api.recorded_actions().await.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend payloads
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cycle_decoded_from_backend_json_resolves() {
    let portal = Portal::new();
    let id = CycleId::new();
    let json = format!(
        r#"{{
            "id": "{id}",
            "treatmentId": "{treatment}",
            "patientId": "{patient}",
            "cycleNumber": 1,
            "treatmentType": "IVF",
            "stepType": "IVF_FERTILIZATION",
            "status": 2,
            "startDate": "2024-02-10T08:30:00",
            "endDate": "not a date",
            "notes": "[{{\"name\": \"Stimulation\", \"status\": \"Completed\"}}]"
        }}"#,
        id = id,
        treatment = TreatmentId::new(),
        patient = PatientId::new(),
    );
    let cycle: Cycle = serde_json::from_str(&json).unwrap();
    assert!(cycle.start_date.is_some());
    assert!(cycle.end_date.is_none());
    assert_eq!(cycle.parsed_notes().phases.len(), 1);
    portal.api.insert_cycle(cycle).await;

    let view = portal
        .query()
        .handle(GetCycleEligibilityQuery { cycle_id: id })
        .await
        .unwrap();

    assert_eq!(view.state, CycleState::InProgress);
    assert_eq!(view.label, "In Progress");
    assert!(view.eligibility.is_at_fertilization_step);
    assert!(view.eligibility.can_complete);

    let rendered = serde_json::to_value(&view.eligibility).unwrap();
    assert_eq!(rendered["isAtIUIProcedureStep"], false);
    assert_eq!(rendered["isAtFertilizationStep"], true);
}
