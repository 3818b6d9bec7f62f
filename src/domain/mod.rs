//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, enums, errors)
//! - `cycle` - Cycle status normalization, type/step inference, eligibility
//! - `sample` - Lab samples and collection-step readiness

pub mod cycle;
pub mod foundation;
pub mod sample;
