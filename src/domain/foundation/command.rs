//! Explicit actor context for command handlers.
//!
//! The portal's signed-in user and doctor profile are passed to every command
//! handler as an [`ActorContext`] value. Nothing in the crate reads ambient
//! session state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DoctorId, UserId};

/// Who is issuing a command, plus request correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// The signed-in portal user.
    pub user_id: UserId,

    /// Doctor profile of the user, when the user is a doctor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<DoctorId>,

    /// Links related operations across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "portal", "cli").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl ActorContext {
    /// Creates a context for the given user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            doctor_id: None,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: attach the doctor profile.
    pub fn with_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    /// Builder: add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl ActorContext {
    /// Creates a test fixture with a test user ID.
    pub fn test_fixture() -> Self {
        Self::new(UserId::new("test-doctor").unwrap())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_with_user_id_only() {
        let user_id = UserId::new("user-123").unwrap();
        let ctx = ActorContext::new(user_id.clone());

        assert_eq!(ctx.user_id, user_id);
        assert!(ctx.doctor_id.is_none());
        assert!(ctx.source().is_none());
    }

    #[test]
    fn correlation_id_returns_set_value() {
        let ctx = ActorContext::new(UserId::new("user").unwrap()).with_correlation_id("corr-1");
        assert_eq!(ctx.correlation_id(), "corr-1");
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        let ctx = ActorContext::new(UserId::new("user").unwrap());
        assert!(!ctx.correlation_id().is_empty());
    }

    #[test]
    fn serialization_skips_none_fields() {
        let json = serde_json::to_string(&ActorContext::new(UserId::new("u").unwrap())).unwrap();

        assert!(json.contains("user_id"));
        assert!(!json.contains("doctor_id"));
        assert!(!json.contains("correlation_id"));
    }

    #[test]
    fn test_fixture_creates_valid_context() {
        let ctx = ActorContext::test_fixture();
        assert_eq!(ctx.user_id.as_str(), "test-doctor");
        assert_eq!(ctx.source(), Some("test"));
    }
}
