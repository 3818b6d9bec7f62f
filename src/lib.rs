//! Clinic Cycles - treatment-cycle status and action eligibility.
//!
//! Normalizes the clinic API's inconsistent cycle records, infers whether a
//! cycle is IUI or IVF and which clinical step it is at, checks sample
//! readiness at the IVF collection step, and decides which actions (start,
//! complete, cancel, confirm procedure) the portal may offer.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
