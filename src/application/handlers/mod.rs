//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod cycle;

pub use cycle::{
    CancelCycleCommand, CancelCycleHandler, CancelCycleResult, CompleteCycleCommand,
    CompleteCycleHandler, CompleteCycleResult, ConfirmProcedureCommand, ConfirmProcedureHandler,
    ConfirmProcedureResult, CycleAction, CycleActionError, CycleEligibilityView,
    GetCycleEligibilityError, GetCycleEligibilityHandler, GetCycleEligibilityQuery,
    PendingActions, StartCycleCommand, StartCycleHandler, StartCycleResult,
};
