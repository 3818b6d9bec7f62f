//! CancelCycleHandler - Command handler for cancelling a cycle that has not finished.

use std::sync::Arc;

use super::action::{api_failure, prepare, refresh, CycleAction, CycleActionError};
use super::get_cycle_eligibility::CycleEligibilityView;
use super::pending::PendingActions;
use crate::domain::foundation::{ActorContext, CycleId};
use crate::ports::{CancelCycleRequest, ClinicApi, ClinicApiError};

/// Command to cancel a cycle.
#[derive(Debug, Clone)]
pub struct CancelCycleCommand {
    pub cycle_id: CycleId,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl CancelCycleCommand {
    pub fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            reason: None,
            notes: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelCycleResult {
    /// The cycle as the backend now reports it; `None` if the refetch failed.
    pub view: Option<CycleEligibilityView>,
    /// Why the refetch failed. The action itself was applied.
    pub refresh_error: Option<ClinicApiError>,
}

/// Handler for cancelling cycles.
pub struct CancelCycleHandler {
    api: Arc<dyn ClinicApi>,
    pending: Arc<PendingActions>,
}

impl CancelCycleHandler {
    pub fn new(api: Arc<dyn ClinicApi>, pending: Arc<PendingActions>) -> Self {
        Self { api, pending }
    }

    #[tracing::instrument(
        skip(self, cmd, ctx),
        fields(cycle_id = %cmd.cycle_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn handle(
        &self,
        cmd: CancelCycleCommand,
        ctx: ActorContext,
    ) -> Result<CancelCycleResult, CycleActionError> {
        let action = CycleAction::Cancel;
        let (_slot, _) = prepare(self.api.as_ref(), &self.pending, cmd.cycle_id, action).await?;

        let request = CancelCycleRequest {
            reason: cmd.reason,
            notes: cmd.notes,
        };
        self.api
            .cancel_cycle(&cmd.cycle_id, request)
            .await
            .map_err(|e| api_failure(cmd.cycle_id, action, e))?;
        tracing::info!(cycle_id = %cmd.cycle_id, "Cycle cancelled");

        let (view, refresh_error) = refresh(self.api.as_ref(), cmd.cycle_id, action).await;
        Ok(CancelCycleResult {
            view,
            refresh_error,
        })
    }
}
