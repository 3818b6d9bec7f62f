//! Strongly-typed identifier value objects.
//!
//! The clinic backend issues GUIDs for every entity; each entity kind gets its
//! own newtype so a patient id can never be passed where a cycle id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a treatment cycle.
    CycleId
);

uuid_id!(
    /// Unique identifier for a treatment plan (IUI, IVF, consultation).
    TreatmentId
);

uuid_id!(
    /// Unique identifier for a patient.
    PatientId
);

uuid_id!(
    /// Unique identifier for a doctor profile.
    DoctorId
);

uuid_id!(
    /// Unique identifier for a lab sample.
    SampleId
);

/// Identifier of the signed-in portal user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_id_generates_unique_values() {
        assert_ne!(CycleId::new(), CycleId::new());
    }

    #[test]
    fn treatment_id_parses_from_valid_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: TreatmentId = uuid_str.parse().unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn patient_id_rejects_garbage() {
        assert!("not-a-guid".parse::<PatientId>().is_err());
    }

    #[test]
    fn sample_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(SampleId::from_uuid(uuid).as_uuid(), &uuid);
    }

    #[test]
    fn ids_serialize_as_bare_strings() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: DoctorId = uuid_str.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid_str));
    }

    #[test]
    fn user_id_rejects_blank_string() {
        match UserId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "user_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn user_id_displays_correctly() {
        let id = UserId::new("dr-456").unwrap();
        assert_eq!(format!("{}", id), "dr-456");
    }
}
