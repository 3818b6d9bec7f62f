//! Cycle module - treatment cycle classification and action eligibility.
//!
//! Everything here is a pure function of already-fetched snapshots. Nothing
//! caches, mutates, or performs I/O, so results can be recomputed freely.
//!
//! - `status` - raw status normalization
//! - `inference` - IUI/IVF type inference with ordered fallbacks
//! - `step` - clinical step detection from redundant signals
//! - `eligibility` - action flags for the presentation layer
//! - `notes` - phase lists embedded in the notes field

mod eligibility;
mod inference;
mod notes;
mod record;
mod status;
mod step;

pub use eligibility::{
    can_cancel, can_complete, can_start, is_at_collection_step, is_at_fertilization_step,
    is_at_iui_procedure_step,
    resolve_eligibility, resolve_eligibility_in, CompletionBlocker, CycleEligibility,
};
pub use inference::{
    from_cycle_field, from_cycle_name, from_parent_treatment, from_siblings,
    infer_treatment_type, infer_treatment_type_with_source, TypeContext, TypeInference,
    TypeSource, TYPE_EXTRACTORS,
};
pub use notes::{CycleNotes, CyclePhase};
pub use record::{Cycle, Treatment};
pub use status::{normalize_status, RawStatus};
pub use step::{is_at_step, is_at_step_as, ClinicalStep, CurrentStep, StepSignature};
