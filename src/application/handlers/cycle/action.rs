//! Shared pieces of the cycle action handlers.
//!
//! Every action follows the same path: claim the in-flight slot, refetch the
//! cycle and recompute its eligibility, refuse if the action is not offered,
//! call the API, then refetch so the caller sees the backend's new state.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::get_cycle_eligibility::{load_view, CycleEligibilityView};
use super::pending::{PendingActions, PendingSlot};
use crate::domain::cycle::CompletionBlocker;
use crate::domain::foundation::{CycleId, DomainError, ErrorCode};
use crate::ports::{ClinicApi, ClinicApiError};

/// Mutating operations on a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleAction {
    Start,
    Complete,
    Cancel,
    ConfirmProcedure,
}

impl fmt::Display for CycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleAction::Start => "start the cycle",
            CycleAction::Complete => "complete the cycle",
            CycleAction::Cancel => "cancel the cycle",
            CycleAction::ConfirmProcedure => "confirm the IUI procedure",
        };
        f.write_str(s)
    }
}

/// Error type shared by the cycle action handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleActionError {
    #[error("Cycle not found: {0}")]
    NotFound(CycleId),

    #[error("Cannot {action}: {reason}")]
    NotEligible { action: CycleAction, reason: String },

    #[error("Another action is already in progress for cycle {0}")]
    ActionPending(CycleId),

    #[error(transparent)]
    Api(#[from] ClinicApiError),
}

impl From<CycleActionError> for DomainError {
    fn from(err: CycleActionError) -> Self {
        let message = err.to_string();
        match err {
            CycleActionError::NotFound(id) => {
                DomainError::new(ErrorCode::CycleNotFound, message).with_detail("cycle_id", id.to_string())
            }
            CycleActionError::NotEligible { action, .. } => {
                DomainError::new(ErrorCode::ActionNotEligible, message).with_detail("action", action.to_string())
            }
            CycleActionError::ActionPending(id) => {
                DomainError::new(ErrorCode::ActionPending, message).with_detail("cycle_id", id.to_string())
            }
            CycleActionError::Api(api) => api.into(),
        }
    }
}

/// Why the resolved flags do not offer `action`, or `None` if they do.
pub(crate) fn refusal_reason(action: CycleAction, view: &CycleEligibilityView) -> Option<String> {
    let eligibility = &view.eligibility;
    match action {
        CycleAction::Start if !eligibility.can_start => Some(format!(
            "cycle is {}; only planned or scheduled cycles can be started",
            view.label
        )),
        CycleAction::Complete if !eligibility.can_complete => {
            let reasons: Vec<String> = eligibility
                .completion_blockers()
                .into_iter()
                .map(|blocker| match blocker {
                    CompletionBlocker::NotInProgress { state } => format!(
                        "cycle is {}; only in-progress cycles can be completed",
                        state.label()
                    ),
                    CompletionBlocker::MissingSamples { .. } => view
                        .readiness
                        .describe_missing()
                        .unwrap_or_else(|| "required samples are not quality-checked".to_string()),
                })
                .collect();
            Some(reasons.join("; "))
        }
        CycleAction::Cancel if !eligibility.can_cancel => {
            Some(format!("cycle is already {}", view.label))
        }
        CycleAction::ConfirmProcedure if !eligibility.is_at_iui_procedure_step => {
            Some("cycle is not an in-progress IUI cycle at the procedure step".to_string())
        }
        _ => None,
    }
}

/// Claims the in-flight slot and checks the action against fresh data.
pub(crate) async fn prepare<'a>(
    api: &dyn ClinicApi,
    pending: &'a PendingActions,
    cycle_id: CycleId,
    action: CycleAction,
) -> Result<(PendingSlot<'a>, CycleEligibilityView), CycleActionError> {
    let slot = pending.try_claim(cycle_id).ok_or_else(|| {
        tracing::info!(%cycle_id, %action, "Action already in flight");
        CycleActionError::ActionPending(cycle_id)
    })?;

    let view = load_view(api, &cycle_id)
        .await?
        .ok_or(CycleActionError::NotFound(cycle_id))?;

    if let Some(reason) = refusal_reason(action, &view) {
        tracing::info!(%cycle_id, %action, %reason, "Action refused");
        return Err(CycleActionError::NotEligible { action, reason });
    }

    Ok((slot, view))
}

/// Refetches the cycle after the backend accepted an action.
///
/// The action stands either way, so a failed refetch is returned next to an
/// empty view instead of as an error.
pub(crate) async fn refresh(
    api: &dyn ClinicApi,
    cycle_id: CycleId,
    action: CycleAction,
) -> (Option<CycleEligibilityView>, Option<ClinicApiError>) {
    let result = load_view(api, &cycle_id).await.and_then(|view| {
        view.ok_or_else(|| ClinicApiError::NotFound(format!("treatment cycle {}", cycle_id)))
    });
    match result {
        Ok(view) => (Some(view), None),
        Err(err) => {
            tracing::warn!(%cycle_id, %action, error = %err, "Action applied but the cycle could not be refetched");
            (None, Some(err))
        }
    }
}

/// Logs an API failure for an action and wraps it.
pub(crate) fn api_failure(cycle_id: CycleId, action: CycleAction, err: ClinicApiError) -> CycleActionError {
    tracing::warn!(%cycle_id, %action, error = %err, "Clinic API refused or failed the action");
    CycleActionError::Api(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_eligible_message_names_action_and_reason() {
        let err = CycleActionError::NotEligible {
            action: CycleAction::ConfirmProcedure,
            reason: "cycle is Completed".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot confirm the IUI procedure: cycle is Completed");
    }

    #[test]
    fn errors_convert_to_domain_codes() {
        let id = CycleId::new();

        let pending: DomainError = CycleActionError::ActionPending(id).into();
        assert_eq!(pending.code, ErrorCode::ActionPending);

        let refused: DomainError = CycleActionError::NotEligible {
            action: CycleAction::Start,
            reason: "no".to_string(),
        }
        .into();
        assert_eq!(refused.code, ErrorCode::ActionNotEligible);

        let upstream: DomainError = CycleActionError::Api(ClinicApiError::rejected(409, "x")).into();
        assert_eq!(upstream.code, ErrorCode::UpstreamRejected);
    }

    #[test]
    fn action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CycleAction::ConfirmProcedure).unwrap(),
            "\"confirm_procedure\""
        );
    }
}
