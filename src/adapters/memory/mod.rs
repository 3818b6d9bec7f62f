//! In-memory adapters.

mod in_memory_clinic_api;

pub use in_memory_clinic_api::{InMemoryClinicApi, RecordedAction};
