//! CompleteCycleHandler - Command handler for completing an in-progress cycle.
//!
//! At the IVF collection step completion is refused until both sperm and
//! oocyte samples are quality-checked; the refusal names the missing kinds.

use std::sync::Arc;

use super::action::{api_failure, prepare, refresh, CycleAction, CycleActionError};
use super::get_cycle_eligibility::CycleEligibilityView;
use super::pending::PendingActions;
use crate::domain::foundation::{ActorContext, CycleId, Timestamp};
use crate::ports::{ClinicApi, ClinicApiError, CompleteCycleRequest};

/// Command to complete a cycle.
#[derive(Debug, Clone)]
pub struct CompleteCycleCommand {
    pub cycle_id: CycleId,
    /// Defaults to now.
    pub end_date: Option<Timestamp>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

impl CompleteCycleCommand {
    pub fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            end_date: None,
            outcome: None,
            notes: None,
        }
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }
}

/// Result of a successful completion.
#[derive(Debug, Clone)]
pub struct CompleteCycleResult {
    /// The cycle as the backend now reports it; `None` if the refetch failed.
    pub view: Option<CycleEligibilityView>,
    /// Why the refetch failed. The action itself was applied.
    pub refresh_error: Option<ClinicApiError>,
}

/// Handler for completing cycles.
pub struct CompleteCycleHandler {
    api: Arc<dyn ClinicApi>,
    pending: Arc<PendingActions>,
}

impl CompleteCycleHandler {
    pub fn new(api: Arc<dyn ClinicApi>, pending: Arc<PendingActions>) -> Self {
        Self { api, pending }
    }

    #[tracing::instrument(
        skip(self, cmd, ctx),
        fields(cycle_id = %cmd.cycle_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn handle(
        &self,
        cmd: CompleteCycleCommand,
        ctx: ActorContext,
    ) -> Result<CompleteCycleResult, CycleActionError> {
        let action = CycleAction::Complete;
        let (_slot, _) = prepare(self.api.as_ref(), &self.pending, cmd.cycle_id, action).await?;

        let request = CompleteCycleRequest {
            end_date: cmd.end_date.unwrap_or_else(Timestamp::now),
            outcome: cmd.outcome,
            notes: cmd.notes,
        };
        self.api
            .complete_cycle(&cmd.cycle_id, request)
            .await
            .map_err(|e| api_failure(cmd.cycle_id, action, e))?;
        tracing::info!(cycle_id = %cmd.cycle_id, "Cycle completed");

        let (view, refresh_error) = refresh(self.api.as_ref(), cmd.cycle_id, action).await;
        Ok(CompleteCycleResult {
            view,
            refresh_error,
        })
    }
}
