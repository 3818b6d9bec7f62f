//! StartCycleHandler - Command handler for starting a planned or scheduled cycle.

use std::sync::Arc;

use super::action::{api_failure, prepare, refresh, CycleAction, CycleActionError};
use super::get_cycle_eligibility::CycleEligibilityView;
use super::pending::PendingActions;
use crate::domain::foundation::{ActorContext, CycleId, Timestamp};
use crate::ports::{ClinicApi, ClinicApiError, StartCycleRequest};

/// Command to start a cycle.
#[derive(Debug, Clone)]
pub struct StartCycleCommand {
    pub cycle_id: CycleId,
    /// Defaults to now.
    pub start_date: Option<Timestamp>,
}

impl StartCycleCommand {
    pub fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            start_date: None,
        }
    }
}

/// Result of a successful start: the cycle as the backend now reports it.
#[derive(Debug, Clone)]
pub struct StartCycleResult {
    /// The cycle as the backend now reports it; `None` if the refetch failed.
    pub view: Option<CycleEligibilityView>,
    /// Why the refetch failed. The action itself was applied.
    pub refresh_error: Option<ClinicApiError>,
}

/// Handler for starting cycles.
pub struct StartCycleHandler {
    api: Arc<dyn ClinicApi>,
    pending: Arc<PendingActions>,
}

impl StartCycleHandler {
    pub fn new(api: Arc<dyn ClinicApi>, pending: Arc<PendingActions>) -> Self {
        Self { api, pending }
    }

    #[tracing::instrument(
        skip(self, cmd, ctx),
        fields(cycle_id = %cmd.cycle_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn handle(
        &self,
        cmd: StartCycleCommand,
        ctx: ActorContext,
    ) -> Result<StartCycleResult, CycleActionError> {
        let action = CycleAction::Start;
        let (_slot, _) = prepare(self.api.as_ref(), &self.pending, cmd.cycle_id, action).await?;

        let request = StartCycleRequest {
            start_date: cmd.start_date.unwrap_or_else(Timestamp::now),
        };
        self.api
            .start_cycle(&cmd.cycle_id, request)
            .await
            .map_err(|e| api_failure(cmd.cycle_id, action, e))?;
        tracing::info!(cycle_id = %cmd.cycle_id, "Cycle started");

        let (view, refresh_error) = refresh(self.api.as_ref(), cmd.cycle_id, action).await;
        Ok(StartCycleResult {
            view,
            refresh_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryClinicApi, RecordedAction};
    use crate::domain::cycle::Cycle;
    use crate::domain::foundation::{CycleState, PatientId, TreatmentId};
    use std::time::Duration;

    async fn setup(status: &str) -> (Arc<InMemoryClinicApi>, StartCycleHandler, CycleId) {
        let api = Arc::new(InMemoryClinicApi::new());
        let cycle = Cycle::new(CycleId::new(), TreatmentId::new(), PatientId::new()).with_status(status);
        let id = cycle.id;
        api.insert_cycle(cycle).await;
        let handler = StartCycleHandler::new(api.clone(), Arc::new(PendingActions::new()));
        (api, handler, id)
    }

    #[tokio::test]
    async fn starts_scheduled_cycle_and_returns_refetched_view() {
        let (api, handler, id) = setup("Scheduled").await;
        let start = Timestamp::parse("2024-03-01").unwrap();

        let result = handler
            .handle(
                StartCycleCommand {
                    cycle_id: id,
                    start_date: Some(start),
                },
                ActorContext::test_fixture(),
            )
            .await
            .unwrap();

        assert_eq!(result.view.as_ref().unwrap().state, CycleState::InProgress);
        assert!(!result.view.as_ref().unwrap().eligibility.can_start);
        assert!(result.view.as_ref().unwrap().eligibility.can_complete);
        assert_eq!(
            api.recorded_actions().await,
            vec![RecordedAction::Start(id, StartCycleRequest { start_date: start })]
        );
    }

    #[tokio::test]
    async fn in_progress_cycle_is_refused_without_calling_api() {
        let (api, handler, id) = setup("In Progress").await;

        let result = handler
            .handle(StartCycleCommand::new(id), ActorContext::test_fixture())
            .await;

        match result {
            Err(CycleActionError::NotEligible { action, reason }) => {
                assert_eq!(action, CycleAction::Start);
                assert!(reason.contains("In Progress"), "{}", reason);
            }
            other => panic!("expected NotEligible, got {:?}", other),
        }
        assert!(api.recorded_actions().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_cycle_is_not_found() {
        let (_, handler, _) = setup("Planned").await;
        let missing = CycleId::new();

        let result = handler
            .handle(StartCycleCommand::new(missing), ActorContext::test_fixture())
            .await;

        assert_eq!(result.unwrap_err(), CycleActionError::NotFound(missing));
    }

    #[tokio::test]
    async fn api_failure_is_returned_and_state_unchanged() {
        let (api, handler, id) = setup("Planned").await;
        api.fail_actions_with(Some(ClinicApiError::Unauthorized)).await;

        let result = handler
            .handle(StartCycleCommand::new(id), ActorContext::test_fixture())
            .await;

        assert_eq!(result.unwrap_err(), CycleActionError::Api(ClinicApiError::Unauthorized));
        assert_eq!(api.cycle_state(&id).await, Some(CycleState::Planned));
    }

    #[tokio::test]
    async fn concurrent_start_on_same_cycle_is_pending() {
        let (api, handler, id) = setup("Planned").await;
        api.delay_actions(Some(Duration::from_millis(50))).await;

        let (first, second) = tokio::join!(
            handler.handle(StartCycleCommand::new(id), ActorContext::test_fixture()),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                handler
                    .handle(StartCycleCommand::new(id), ActorContext::test_fixture())
                    .await
            }
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), CycleActionError::ActionPending(id));
        assert_eq!(api.recorded_actions().await.len(), 1);
    }
}
