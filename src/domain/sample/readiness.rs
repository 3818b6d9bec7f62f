//! Sample readiness evaluation for the IVF collection step.
//!
//! Policy:
//! - a sample is ready when its status is one of [`QUALITY_CHECKED_STATUSES`];
//! - with no sperm and no oocyte samples at all, the cycle is ready (the
//!   check is deferred to a later step, absence is not failure);
//! - otherwise each kind needs at least one ready sample, and every kind
//!   without one is listed in `missing`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record::{Sample, SampleKind};
use crate::domain::foundation::fold_label;

/// Lifecycle statuses at or beyond lab quality check.
pub const QUALITY_CHECKED_STATUSES: [&str; 6] = [
    "QualityChecked",
    "Fertilized",
    "CulturedEmbryo",
    "Stored",
    "Used",
    "Frozen",
];

/// True if the status label is a quality-checked status.
///
/// Comparison ignores case, whitespace, underscores and hyphens, so
/// "Quality Checked" and "quality_checked" both count.
pub fn is_quality_checked_status(status: &str) -> bool {
    let folded = fold_label(status);
    QUALITY_CHECKED_STATUSES
        .iter()
        .any(|known| fold_label(known) == folded)
}

/// Outcome of a readiness evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReadiness {
    pub ready: bool,
    /// Kinds that have samples on record but none quality-checked, or that
    /// are absent while the other kind is present.
    pub missing: BTreeSet<SampleKind>,
}

impl SampleReadiness {
    /// Readiness for steps that never require samples.
    pub fn not_required() -> Self {
        Self {
            ready: true,
            missing: BTreeSet::new(),
        }
    }

    /// Evaluates the sperm and oocyte samples known for a patient.
    pub fn evaluate(sperm: &[Sample], oocyte: &[Sample]) -> Self {
        if sperm.is_empty() && oocyte.is_empty() {
            return Self::not_required();
        }

        let missing: BTreeSet<SampleKind> = [(SampleKind::Sperm, sperm), (SampleKind::Oocyte, oocyte)]
            .into_iter()
            .filter(|(_, samples)| !samples.iter().any(Sample::is_quality_checked))
            .map(|(kind, _)| kind)
            .collect();

        Self {
            ready: missing.is_empty(),
            missing,
        }
    }

    /// Human-readable reason when not ready, e.g. "No quality-checked oocyte sample".
    pub fn describe_missing(&self) -> Option<String> {
        if self.missing.is_empty() {
            return None;
        }
        let kinds: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
        Some(format!("No quality-checked {} sample", kinds.join(" or ")))
    }
}

impl Default for SampleReadiness {
    fn default() -> Self {
        Self::not_required()
    }
}
