//! Structured view of a cycle's free-text `notes` field.
//!
//! Some cycles store a serialized phase list in `notes`, either as a bare
//! JSON array or as an object with a `phases` array. Parsing never fails:
//! anything that is not one of those shapes is kept as plain text with an
//! empty phase list.

use serde::{Deserialize, Serialize};

/// One phase entry embedded in cycle notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CyclePhase {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Parsed notes: phases when present, otherwise the raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleNotes {
    pub phases: Vec<CyclePhase>,
    /// Plain-text notes when the field was not a phase list.
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhaseDocument {
    List(Vec<CyclePhase>),
    Wrapped { phases: Vec<CyclePhase> },
}

impl CycleNotes {
    /// Parses the notes field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<PhaseDocument>(trimmed) {
            Ok(PhaseDocument::List(phases)) | Ok(PhaseDocument::Wrapped { phases }) => Self {
                phases,
                text: None,
            },
            Err(_) => Self {
                phases: Vec::new(),
                text: Some(raw.to_string()),
            },
        }
    }

    /// Returns the phase with the given name, ignoring case.
    pub fn phase(&self, name: &str) -> Option<&CyclePhase> {
        self.phases
            .iter()
            .find(|phase| phase.name.eq_ignore_ascii_case(name))
    }
}
