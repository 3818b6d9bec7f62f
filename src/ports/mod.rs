//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ClinicApi` - the clinic REST service: cycle, treatment and sample
//!   reads plus the start/complete/cancel/confirm-procedure actions

mod clinic_api;

pub use clinic_api::{
    CancelCycleRequest, ClinicApi, ClinicApiError, CompleteCycleRequest, ConfirmProcedureRequest,
    StartCycleRequest,
};
