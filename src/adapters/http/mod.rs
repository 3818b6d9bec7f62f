//! HTTP adapters.

mod clinic_api_client;

pub use clinic_api_client::{HttpClinicApi, HttpClinicApiConfig};
