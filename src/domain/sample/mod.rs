//! Sample module - lab samples and collection readiness.
//!
//! Readiness decides whether an IVF collection-step cycle may be completed.
//! It is only consulted for that step.

mod readiness;
mod record;

pub use readiness::{is_quality_checked_status, SampleReadiness, QUALITY_CHECKED_STATUSES};
pub use record::{Sample, SampleKind};
