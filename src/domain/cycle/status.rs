//! Status normalizer - maps raw backend status values to [`CycleState`].
//!
//! The backend has emitted cycle status as enum names in several casings,
//! as human labels ("In Progress"), and as numeric enum ordinals. Every input
//! maps to exactly one state; anything unrecognised is `Planned`, which
//! enables no action that needs a started cycle.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{fold_label, CycleState};

/// Status value exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    /// Numeric enum ordinal.
    Code(i64),
    /// Enum name or label.
    Text(String),
    /// Anything else (floats, booleans, objects).
    Other(serde_json::Value),
}

impl From<&str> for RawStatus {
    fn from(value: &str) -> Self {
        RawStatus::Text(value.to_string())
    }
}

impl From<i64> for RawStatus {
    fn from(value: i64) -> Self {
        RawStatus::Code(value)
    }
}

/// Backend enum ordinals, in declaration order.
const STATUS_CODES: [(i64, CycleState); 5] = [
    (0, CycleState::Planned),
    (1, CycleState::Scheduled),
    (2, CycleState::InProgress),
    (3, CycleState::Completed),
    (4, CycleState::Cancelled),
];

/// Synonyms keyed by their folded form (see [`fold_label`]).
static STATUS_SYNONYMS: Lazy<HashMap<&'static str, CycleState>> = Lazy::new(|| {
    use CycleState::*;
    HashMap::from([
        ("planned", Planned),
        ("draft", Planned),
        ("pending", Planned),
        ("new", Planned),
        ("notstarted", Planned),
        ("scheduled", Scheduled),
        ("booked", Scheduled),
        ("inprogress", InProgress),
        ("active", InProgress),
        ("started", InProgress),
        ("ongoing", InProgress),
        ("completed", Completed),
        ("complete", Completed),
        ("done", Completed),
        ("finished", Completed),
        ("cancelled", Cancelled),
        ("canceled", Cancelled),
        ("aborted", Cancelled),
    ])
});

impl CycleState {
    /// Maps a numeric status code; unknown codes are `Planned`.
    pub fn from_code(code: i64) -> Self {
        STATUS_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, state)| *state)
            .unwrap_or(CycleState::Planned)
    }

    /// Maps a textual status; unknown text is `Planned`.
    ///
    /// Numeric strings go through the code table.
    pub fn from_text(raw: &str) -> Self {
        if let Ok(code) = raw.trim().parse::<i64>() {
            return Self::from_code(code);
        }
        let folded = fold_label(raw);
        STATUS_SYNONYMS
            .get(folded.as_str())
            .copied()
            .unwrap_or(CycleState::Planned)
    }
}

/// Normalizes a raw status into the canonical cycle state.
pub fn normalize_status(raw: Option<&RawStatus>) -> CycleState {
    match raw {
        Some(RawStatus::Code(code)) => CycleState::from_code(*code),
        Some(RawStatus::Text(text)) => CycleState::from_text(text),
        Some(RawStatus::Other(_)) | None => CycleState::Planned,
    }
}
