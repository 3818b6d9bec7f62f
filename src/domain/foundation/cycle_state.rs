//! CycleState enum - canonical lifecycle state of a treatment cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Canonical state of a treatment cycle.
///
/// The backend emits many spellings and numeric codes for these; see
/// `domain::cycle::normalize_status` for the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum CycleState {
    #[default]
    Planned,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl CycleState {
    /// All states in lifecycle order.
    pub const ALL: [CycleState; 5] = [
        CycleState::Planned,
        CycleState::Scheduled,
        CycleState::InProgress,
        CycleState::Completed,
        CycleState::Cancelled,
    ];

    /// Returns true if the cycle has not started yet.
    pub fn is_not_started(&self) -> bool {
        matches!(self, CycleState::Planned | CycleState::Scheduled)
    }

    /// Returns true if the cycle is finished (completed or cancelled).
    pub fn is_finished(&self) -> bool {
        matches!(self, CycleState::Completed | CycleState::Cancelled)
    }

    /// Human-readable label shown in the portal.
    pub fn label(&self) -> &'static str {
        match self {
            CycleState::Planned => "Planned",
            CycleState::Scheduled => "Scheduled",
            CycleState::InProgress => "In Progress",
            CycleState::Completed => "Completed",
            CycleState::Cancelled => "Cancelled",
        }
    }
}

impl StateMachine for CycleState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CycleState::*;
        matches!(
            (self, target),
            (Planned, Scheduled)
                | (Planned, InProgress)
                | (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Planned, Cancelled)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CycleState::*;
        match self {
            Planned => vec![Scheduled, InProgress, Cancelled],
            Scheduled => vec![InProgress, Cancelled],
            InProgress => vec![Completed, Cancelled],
            Completed | Cancelled => vec![],
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
