//! In-memory clinic API for tests and local demos.
//!
//! Mirrors the backend's transition rules so handlers can act and then
//! refetch, and supports failure injection for sample reads and actions.
//!
//! # Example
//!
//! ```ignore
//! let api = Arc::new(InMemoryClinicApi::new());
//! api.insert_cycle(cycle).await;
//! api.fail_sample_reads(true).await;
//!
//! let view = GetCycleEligibilityHandler::new(api.clone()).handle(query).await?;
//! assert_eq!(api.recorded_actions().await.len(), 0);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::cycle::{Cycle, RawStatus, Treatment};
use crate::domain::foundation::{CycleId, CycleState, PatientId, StateMachine, TreatmentId};
use crate::domain::sample::{Sample, SampleKind};
use crate::ports::{
    CancelCycleRequest, ClinicApi, ClinicApiError, CompleteCycleRequest, ConfirmProcedureRequest,
    StartCycleRequest,
};

/// Step a cycle moves to once its IUI procedure is confirmed.
const POST_PROCEDURE_STEP: &str = "step5_post_iui";
const POST_PROCEDURE_STEP_TYPE: &str = "IUI_POST";

/// An action call the in-memory API received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAction {
    Start(CycleId, StartCycleRequest),
    Complete(CycleId, CompleteCycleRequest),
    Cancel(CycleId, CancelCycleRequest),
    ConfirmProcedure(CycleId, ConfirmProcedureRequest),
}

#[derive(Default)]
struct Store {
    cycles: HashMap<CycleId, Cycle>,
    treatments: HashMap<TreatmentId, Treatment>,
    samples: Vec<Sample>,
    actions: Vec<RecordedAction>,
}

#[derive(Default)]
struct Faults {
    sample_reads: bool,
    treatment_reads: bool,
    cycle_reads_after_action: bool,
    actions: Option<ClinicApiError>,
    action_delay: Option<Duration>,
}

/// In-memory [`ClinicApi`].
#[derive(Default)]
pub struct InMemoryClinicApi {
    store: RwLock<Store>,
    faults: RwLock<Faults>,
}

impl InMemoryClinicApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_cycle(&self, cycle: Cycle) {
        self.store.write().await.cycles.insert(cycle.id, cycle);
    }

    pub async fn insert_treatment(&self, treatment: Treatment) {
        self.store.write().await.treatments.insert(treatment.id, treatment);
    }

    pub async fn insert_sample(&self, sample: Sample) {
        self.store.write().await.samples.push(sample);
    }

    /// Makes every sample read fail with `Unavailable`.
    pub async fn fail_sample_reads(&self, fail: bool) {
        self.faults.write().await.sample_reads = fail;
    }

    /// Makes every treatment read fail with `Unavailable`.
    pub async fn fail_treatment_reads(&self, fail: bool) {
        self.faults.write().await.treatment_reads = fail;
    }

    /// Makes cycle reads fail with `Unavailable` once any action was applied.
    pub async fn fail_cycle_reads_after_actions(&self, fail: bool) {
        self.faults.write().await.cycle_reads_after_action = fail;
    }

    /// Makes every action fail with the given error.
    pub async fn fail_actions_with(&self, error: Option<ClinicApiError>) {
        self.faults.write().await.actions = error;
    }

    /// Delays every action, to observe in-flight behaviour.
    pub async fn delay_actions(&self, delay: Option<Duration>) {
        self.faults.write().await.action_delay = delay;
    }

    /// Actions received so far, in order.
    pub async fn recorded_actions(&self) -> Vec<RecordedAction> {
        self.store.read().await.actions.clone()
    }

    /// Current state of a stored cycle.
    pub async fn cycle_state(&self, id: &CycleId) -> Option<CycleState> {
        self.store.read().await.cycles.get(id).map(Cycle::state)
    }

    /// Applies delay and injected failure shared by all actions.
    async fn before_action(&self) -> Result<(), ClinicApiError> {
        let (delay, failure) = {
            let faults = self.faults.read().await;
            (faults.action_delay, faults.actions.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Records the action and moves the cycle to `target`, as the backend would.
    async fn transition(
        &self,
        id: &CycleId,
        target: CycleState,
        action: RecordedAction,
    ) -> Result<(), ClinicApiError> {
        self.before_action().await?;

        let mut store = self.store.write().await;
        let cycle = store
            .cycles
            .get_mut(id)
            .ok_or_else(|| ClinicApiError::NotFound(format!("treatment cycle {}", id)))?;

        cycle
            .state()
            .transition_to(target)
            .map_err(|e| ClinicApiError::rejected(409, e.to_string()))?;

        cycle.status = Some(RawStatus::Text(format!("{:?}", target)));
        match &action {
            RecordedAction::Start(_, request) => cycle.start_date = Some(request.start_date),
            RecordedAction::Complete(_, request) => cycle.end_date = Some(request.end_date),
            RecordedAction::Cancel(_, _) | RecordedAction::ConfirmProcedure(_, _) => {}
        }
        store.actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl ClinicApi for InMemoryClinicApi {
    async fn get_cycle(&self, id: &CycleId) -> Result<Option<Cycle>, ClinicApiError> {
        let fail_after_action = self.faults.read().await.cycle_reads_after_action;
        let store = self.store.read().await;
        if fail_after_action && !store.actions.is_empty() {
            return Err(ClinicApiError::Unavailable("cycles offline".to_string()));
        }
        Ok(store.cycles.get(id).cloned())
    }

    async fn get_treatment(&self, id: &TreatmentId) -> Result<Option<Treatment>, ClinicApiError> {
        if self.faults.read().await.treatment_reads {
            return Err(ClinicApiError::Unavailable("treatments offline".to_string()));
        }
        Ok(self.store.read().await.treatments.get(id).cloned())
    }

    async fn list_cycles_for_treatment(
        &self,
        treatment_id: &TreatmentId,
    ) -> Result<Vec<Cycle>, ClinicApiError> {
        let store = self.store.read().await;
        let mut cycles: Vec<Cycle> = store
            .cycles
            .values()
            .filter(|c| &c.treatment_id == treatment_id)
            .cloned()
            .collect();
        cycles.sort_by_key(|c| c.cycle_number);
        Ok(cycles)
    }

    async fn list_samples(
        &self,
        kind: SampleKind,
        patient_id: &PatientId,
    ) -> Result<Vec<Sample>, ClinicApiError> {
        if self.faults.read().await.sample_reads {
            return Err(ClinicApiError::Unavailable("samples offline".to_string()));
        }
        Ok(self
            .store
            .read()
            .await
            .samples
            .iter()
            .filter(|s| s.sample_type == kind && &s.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn start_cycle(&self, id: &CycleId, request: StartCycleRequest) -> Result<(), ClinicApiError> {
        self.transition(id, CycleState::InProgress, RecordedAction::Start(*id, request))
            .await
    }

    async fn complete_cycle(
        &self,
        id: &CycleId,
        request: CompleteCycleRequest,
    ) -> Result<(), ClinicApiError> {
        self.transition(id, CycleState::Completed, RecordedAction::Complete(*id, request))
            .await
    }

    async fn cancel_cycle(&self, id: &CycleId, request: CancelCycleRequest) -> Result<(), ClinicApiError> {
        self.transition(id, CycleState::Cancelled, RecordedAction::Cancel(*id, request))
            .await
    }

    async fn confirm_procedure(
        &self,
        id: &CycleId,
        request: ConfirmProcedureRequest,
    ) -> Result<(), ClinicApiError> {
        self.before_action().await?;

        let mut store = self.store.write().await;
        let cycle = store
            .cycles
            .get_mut(id)
            .ok_or_else(|| ClinicApiError::NotFound(format!("treatment cycle {}", id)))?;
        if cycle.state() != CycleState::InProgress {
            return Err(ClinicApiError::rejected(409, "Cycle is not in progress"));
        }
        cycle.current_step = Some(POST_PROCEDURE_STEP.to_string());
        cycle.step_type = Some(POST_PROCEDURE_STEP_TYPE.to_string());
        store.actions.push(RecordedAction::ConfirmProcedure(*id, request));
        Ok(())
    }
}
