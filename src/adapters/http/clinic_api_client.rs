//! HTTP client for the clinic REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpClinicApiConfig::new("https://api.clinic.example/api")
//!     .with_access_token(token)
//!     .with_timeout(Duration::from_secs(15));
//!
//! let api = HttpClinicApi::new(config)?;
//! ```
//!
//! JSON bodies are camelCase. List endpoints return either a bare array or an
//! object with a `data` array; both are accepted.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::cycle::{Cycle, Treatment};
use crate::domain::foundation::{CycleId, PatientId, TreatmentId};
use crate::domain::sample::{Sample, SampleKind};
use crate::ports::{
    CancelCycleRequest, ClinicApi, ClinicApiError, CompleteCycleRequest, ConfirmProcedureRequest,
    StartCycleRequest,
};

/// Longest error body quoted back in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Configuration for [`HttpClinicApi`].
#[derive(Debug, Clone)]
pub struct HttpClinicApiConfig {
    /// Base URL including any path prefix, e.g. `https://host/api`.
    pub base_url: String,
    /// Bearer token of the signed-in user.
    access_token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl HttpClinicApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Secret::new(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest implementation of [`ClinicApi`].
pub struct HttpClinicApi {
    config: HttpClinicApiConfig,
    client: Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { data: items } => items,
        }
    }
}

impl HttpClinicApi {
    pub fn new(config: HttpClinicApiConfig) -> Result<Self, ClinicApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClinicApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClinicApiError> {
        self.authorized(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                ClinicApiError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else if e.is_connect() {
                ClinicApiError::network(format!("Connection failed: {}", e))
            } else {
                ClinicApiError::network(e.to_string())
            }
        })
    }

    /// Passes successful responses through; converts the rest to errors.
    async fn check_status(response: Response) -> Result<Response, ClinicApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %url, "Clinic API returned an error status");
        Err(error_for_status(status.as_u16(), &body))
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClinicApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| ClinicApiError::Decode(e.to_string()))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ClinicApiError> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET list");
        let response = self.send(self.client.get(&url).query(query)).await?;
        let response = Self::check_status(response).await?;
        response
            .json::<ListEnvelope<T>>()
            .await
            .map(ListEnvelope::into_vec)
            .map_err(|e| ClinicApiError::Decode(e.to_string()))
    }

    async fn post_action<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClinicApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self.send(self.client.post(&url).json(body)).await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Maps an HTTP error status and body to a [`ClinicApiError`].
pub(crate) fn error_for_status(status: u16, body: &str) -> ClinicApiError {
    let message = error_message(body);
    match status {
        401 => ClinicApiError::Unauthorized,
        403 => ClinicApiError::Forbidden(message),
        404 => ClinicApiError::NotFound(message),
        408 | 504 => ClinicApiError::Unavailable(format!("Gateway timeout: {}", message)),
        500..=599 => ClinicApiError::Unavailable(format!("Server error {}: {}", status, message)),
        _ => ClinicApiError::rejected(status, message),
    }
}

/// Pulls a readable message out of an error body.
///
/// Tries `message`, `title` and `error` fields of a JSON body before falling
/// back to the (truncated) raw text.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "title", "error"] {
            if let Some(text) = parsed.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no details".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[async_trait]
impl ClinicApi for HttpClinicApi {
    async fn get_cycle(&self, id: &CycleId) -> Result<Option<Cycle>, ClinicApiError> {
        self.get_optional(&format!("/treatment-cycles/{}", id)).await
    }

    async fn get_treatment(&self, id: &TreatmentId) -> Result<Option<Treatment>, ClinicApiError> {
        self.get_optional(&format!("/treatments/{}", id)).await
    }

    async fn list_cycles_for_treatment(
        &self,
        treatment_id: &TreatmentId,
    ) -> Result<Vec<Cycle>, ClinicApiError> {
        self.get_list("/treatment-cycles", &[("treatmentId", treatment_id.to_string())])
            .await
    }

    async fn list_samples(
        &self,
        kind: SampleKind,
        patient_id: &PatientId,
    ) -> Result<Vec<Sample>, ClinicApiError> {
        self.get_list(
            "/samples",
            &[
                ("type", kind.query_value().to_string()),
                ("patientId", patient_id.to_string()),
            ],
        )
        .await
    }

    async fn start_cycle(&self, id: &CycleId, request: StartCycleRequest) -> Result<(), ClinicApiError> {
        self.post_action(&format!("/treatment-cycles/{}/start", id), &request)
            .await
    }

    async fn complete_cycle(
        &self,
        id: &CycleId,
        request: CompleteCycleRequest,
    ) -> Result<(), ClinicApiError> {
        self.post_action(&format!("/treatment-cycles/{}/complete", id), &request)
            .await
    }

    async fn cancel_cycle(&self, id: &CycleId, request: CancelCycleRequest) -> Result<(), ClinicApiError> {
        self.post_action(&format!("/treatment-cycles/{}/cancel", id), &request)
            .await
    }

    async fn confirm_procedure(
        &self,
        id: &CycleId,
        request: ConfirmProcedureRequest,
    ) -> Result<(), ClinicApiError> {
        self.post_action(&format!("/treatment-cycles/{}/confirm-procedure", id), &request)
            .await
    }
}
