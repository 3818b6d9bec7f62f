//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the clinic cycle domain.

mod command;
mod cycle_state;
mod errors;
mod ids;
mod label;
mod state_machine;
mod timestamp;
mod treatment_type;

pub use command::ActorContext;
pub use cycle_state::CycleState;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CycleId, DoctorId, PatientId, SampleId, TreatmentId, UserId};
pub use label::fold_label;
pub use state_machine::StateMachine;
pub use timestamp::{lenient_optional, Timestamp};
pub use treatment_type::{CycleType, TreatmentType};
