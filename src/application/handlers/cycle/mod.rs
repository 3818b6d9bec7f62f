//! Cycle command and query handlers.
//!
//! The query resolves a cycle's action flags from fresh API reads; the
//! commands re-check those flags, call the API, and return the refetched view.

mod action;
mod pending;

// Command handlers
mod cancel_cycle;
mod complete_cycle;
mod confirm_procedure;
mod start_cycle;

// Query handlers
mod get_cycle_eligibility;

pub use action::{CycleAction, CycleActionError};
pub use cancel_cycle::{CancelCycleCommand, CancelCycleHandler, CancelCycleResult};
pub use complete_cycle::{CompleteCycleCommand, CompleteCycleHandler, CompleteCycleResult};
pub use confirm_procedure::{
    ConfirmProcedureCommand, ConfirmProcedureHandler, ConfirmProcedureResult,
};
pub use get_cycle_eligibility::{
    CycleEligibilityView, GetCycleEligibilityError, GetCycleEligibilityHandler,
    GetCycleEligibilityQuery,
};
pub use pending::{PendingActions, PendingSlot};
pub use start_cycle::{StartCycleCommand, StartCycleHandler, StartCycleResult};
