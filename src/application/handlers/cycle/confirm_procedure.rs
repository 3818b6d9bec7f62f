//! ConfirmProcedureHandler - Command handler for confirming an IUI insemination.
//!
//! Only offered for in-progress IUI cycles at the procedure step. The backend
//! then moves the cycle on to its post-procedure step.

use std::sync::Arc;

use super::action::{api_failure, prepare, refresh, CycleAction, CycleActionError};
use super::get_cycle_eligibility::CycleEligibilityView;
use super::pending::PendingActions;
use crate::domain::foundation::{ActorContext, CycleId, Timestamp};
use crate::ports::{ClinicApi, ClinicApiError, ConfirmProcedureRequest};

/// Command to confirm the IUI procedure of a cycle.
#[derive(Debug, Clone)]
pub struct ConfirmProcedureCommand {
    pub cycle_id: CycleId,
    /// Defaults to now.
    pub procedure_date: Option<Timestamp>,
    pub notes: Option<String>,
}

impl ConfirmProcedureCommand {
    pub fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            procedure_date: None,
            notes: None,
        }
    }
}

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmProcedureResult {
    /// The cycle as the backend now reports it; `None` if the refetch failed.
    pub view: Option<CycleEligibilityView>,
    /// Why the refetch failed. The action itself was applied.
    pub refresh_error: Option<ClinicApiError>,
}

/// Handler for IUI procedure confirmation.
pub struct ConfirmProcedureHandler {
    api: Arc<dyn ClinicApi>,
    pending: Arc<PendingActions>,
}

impl ConfirmProcedureHandler {
    pub fn new(api: Arc<dyn ClinicApi>, pending: Arc<PendingActions>) -> Self {
        Self { api, pending }
    }

    #[tracing::instrument(
        skip(self, cmd, ctx),
        fields(cycle_id = %cmd.cycle_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn handle(
        &self,
        cmd: ConfirmProcedureCommand,
        ctx: ActorContext,
    ) -> Result<ConfirmProcedureResult, CycleActionError> {
        let action = CycleAction::ConfirmProcedure;
        let (_slot, _) = prepare(self.api.as_ref(), &self.pending, cmd.cycle_id, action).await?;

        let request = ConfirmProcedureRequest {
            procedure_date: cmd.procedure_date.unwrap_or_else(Timestamp::now),
            notes: cmd.notes,
        };
        self.api
            .confirm_procedure(&cmd.cycle_id, request)
            .await
            .map_err(|e| api_failure(cmd.cycle_id, action, e))?;
        tracing::info!(cycle_id = %cmd.cycle_id, "IUI procedure confirmed");

        let (view, refresh_error) = refresh(self.api.as_ref(), cmd.cycle_id, action).await;
        Ok(ConfirmProcedureResult {
            view,
            refresh_error,
        })
    }
}
