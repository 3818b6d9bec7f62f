//! Adapters - implementations of the ports.
//!
//! - `http` - reqwest client for the clinic REST API
//! - `memory` - in-memory clinic API for tests and local runs

pub mod http;
pub mod memory;
