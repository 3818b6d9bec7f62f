//! Eligibility resolver - which cycle actions the portal may offer.
//!
//! Combines the normalized state, the inferred type, step detection and
//! sample readiness into a flag set. Every flag is computed on its own so it
//! can be tested on its own, and a blocked completion always carries its
//! reasons. Missing or malformed data only ever removes permissions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::inference::{infer_treatment_type, TypeContext};
use super::record::Cycle;
use super::step::{is_at_step, is_at_step_as, ClinicalStep};
use crate::domain::foundation::{CycleState, CycleType};
use crate::domain::sample::{SampleKind, SampleReadiness};

/// Why a cycle cannot be completed right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionBlocker {
    /// Only in-progress cycles can be completed.
    NotInProgress { state: CycleState },
    /// Collection step without quality-checked samples of these kinds.
    MissingSamples { kinds: BTreeSet<SampleKind> },
}

/// Action flags for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEligibility {
    pub state: CycleState,
    pub cycle_type: Option<CycleType>,
    pub can_start: bool,
    pub can_complete: bool,
    pub can_cancel: bool,
    #[serde(rename = "isAtIUIProcedureStep")]
    pub is_at_iui_procedure_step: bool,
    pub is_at_fertilization_step: bool,
    /// Sample kinds blocking completion at the collection step.
    pub missing_samples: BTreeSet<SampleKind>,
}

impl CycleEligibility {
    /// Every reason `can_complete` is false; empty when it is true.
    pub fn completion_blockers(&self) -> Vec<CompletionBlocker> {
        let mut blockers = Vec::new();
        if self.state != CycleState::InProgress {
            blockers.push(CompletionBlocker::NotInProgress { state: self.state });
        }
        if !self.missing_samples.is_empty() {
            blockers.push(CompletionBlocker::MissingSamples {
                kinds: self.missing_samples.clone(),
            });
        }
        blockers
    }
}

/// `Planned` and `Scheduled` cycles can be started.
pub fn can_start(state: CycleState) -> bool {
    state.is_not_started()
}

/// In-progress cycles can be completed unless they sit at the collection
/// step without ready samples.
pub fn can_complete(state: CycleState, at_collection_step: bool, readiness: &SampleReadiness) -> bool {
    state == CycleState::InProgress && (!at_collection_step || readiness.ready)
}

/// Anything not yet completed or cancelled can be cancelled.
pub fn can_cancel(state: CycleState) -> bool {
    !state.is_finished()
}

pub fn is_at_iui_procedure_step(cycle: &Cycle, cycle_type: Option<CycleType>, state: CycleState) -> bool {
    cycle_type == Some(CycleType::Iui)
        && is_at_step(cycle, ClinicalStep::IuiInsemination)
        && state == CycleState::InProgress
}

pub fn is_at_fertilization_step(cycle: &Cycle, cycle_type: Option<CycleType>, state: CycleState) -> bool {
    cycle_type == Some(CycleType::Ivf)
        && is_at_step(cycle, ClinicalStep::Fertilization)
        && state == CycleState::InProgress
}

/// Whether samples gate completion: the IVF collection step, where the
/// cycle-position signal does not count for IUI cycles.
pub fn is_at_collection_step(cycle: &Cycle, cycle_type: Option<CycleType>) -> bool {
    is_at_step_as(cycle, ClinicalStep::IvfCollection, cycle_type)
}

/// Resolves eligibility using related records for type inference.
pub fn resolve_eligibility_in(
    cycle: &Cycle,
    ctx: &TypeContext<'_>,
    readiness: &SampleReadiness,
) -> CycleEligibility {
    let state = cycle.state();
    let cycle_type = infer_treatment_type(cycle, ctx);
    let at_collection_step = is_at_collection_step(cycle, cycle_type);

    let missing_samples = if at_collection_step && !readiness.ready {
        readiness.missing.clone()
    } else {
        BTreeSet::new()
    };

    CycleEligibility {
        state,
        cycle_type,
        can_start: can_start(state),
        can_complete: can_complete(state, at_collection_step, readiness),
        can_cancel: can_cancel(state),
        is_at_iui_procedure_step: is_at_iui_procedure_step(cycle, cycle_type, state),
        is_at_fertilization_step: is_at_fertilization_step(cycle, cycle_type, state),
        missing_samples,
    }
}

/// Resolves eligibility from the cycle alone.
pub fn resolve_eligibility(cycle: &Cycle, readiness: &SampleReadiness) -> CycleEligibility {
    resolve_eligibility_in(cycle, &TypeContext::default(), readiness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CycleId, PatientId, SampleId, TreatmentId};
    use crate::domain::sample::Sample;
    use proptest::prelude::*;

    fn cycle() -> Cycle {
        Cycle::new(CycleId::new(), TreatmentId::new(), PatientId::new())
    }

    fn sample(kind: SampleKind, status: &str) -> Sample {
        Sample::new(SampleId::new(), PatientId::new(), kind).with_status(status)
    }

    #[test]
    fn scheduled_cycle_can_start_and_cancel() {
        let c = cycle().with_status("Scheduled").with_cycle_number(1);
        let e = resolve_eligibility(&c, &SampleReadiness::not_required());

        assert!(e.can_start);
        assert!(!e.can_complete);
        assert!(e.can_cancel);
    }

    #[test]
    fn completed_cycle_allows_nothing() {
        let e = resolve_eligibility(&cycle().with_status("Completed"), &SampleReadiness::not_required());

        assert!(!e.can_start);
        assert!(!e.can_complete);
        assert!(!e.can_cancel);
    }

    #[test]
    fn cancelled_cycle_allows_nothing() {
        let e = resolve_eligibility(&cycle().with_status("Cancelled"), &SampleReadiness::not_required());

        assert!(!e.can_start);
        assert!(!e.can_complete);
        assert!(!e.can_cancel);
    }

    #[test]
    fn missing_status_is_least_permissive_planned() {
        let e = resolve_eligibility(&cycle(), &SampleReadiness::not_required());

        assert_eq!(e.state, CycleState::Planned);
        assert!(!e.can_complete);
        assert!(!e.is_at_iui_procedure_step);
        assert!(!e.is_at_fertilization_step);
    }

    #[test]
    fn collection_step_with_unchecked_oocyte_cannot_complete() {
        let c = cycle().with_status("InProgress").with_step_type("IVF_OPU");
        let readiness = SampleReadiness::evaluate(
            &[sample(SampleKind::Sperm, "QualityChecked")],
            &[sample(SampleKind::Oocyte, "Collected")],
        );

        let e = resolve_eligibility(&c, &readiness);

        assert!(!e.can_complete);
        assert_eq!(e.missing_samples, BTreeSet::from([SampleKind::Oocyte]));
        assert_eq!(
            e.completion_blockers(),
            vec![CompletionBlocker::MissingSamples {
                kinds: BTreeSet::from([SampleKind::Oocyte])
            }]
        );
    }

    #[test]
    fn collection_step_without_any_samples_can_complete() {
        let c = cycle().with_status("InProgress").with_cycle_number(3);
        let readiness = SampleReadiness::evaluate(&[], &[]);

        let e = resolve_eligibility(&c, &readiness);

        assert!(e.can_complete);
        assert!(e.completion_blockers().is_empty());
    }

    #[test]
    fn readiness_is_ignored_outside_collection_step() {
        let c = cycle().with_status("InProgress").with_cycle_number(2);
        let readiness = SampleReadiness::evaluate(&[sample(SampleKind::Sperm, "Collected")], &[]);

        let e = resolve_eligibility(&c, &readiness);

        assert!(e.can_complete);
        assert!(e.missing_samples.is_empty());
    }

    #[test]
    fn third_iui_cycle_is_not_gated_on_oocytes() {
        let c = cycle()
            .with_status("InProgress")
            .with_treatment_type("IUI")
            .with_name("IUI Cycle 3")
            .with_cycle_number(3);
        let readiness = SampleReadiness::evaluate(&[sample(SampleKind::Sperm, "QualityChecked")], &[]);

        let e = resolve_eligibility(&c, &readiness);

        assert!(e.can_complete);
        assert!(e.missing_samples.is_empty());
    }

    #[test]
    fn blockers_report_state_and_samples_together() {
        let c = cycle().with_status("Scheduled").with_step_type("IVF_OPU");
        let readiness = SampleReadiness::evaluate(&[sample(SampleKind::Sperm, "Collected")], &[]);

        let blockers = resolve_eligibility(&c, &readiness).completion_blockers();

        assert_eq!(blockers.len(), 2);
        assert_eq!(
            blockers[0],
            CompletionBlocker::NotInProgress {
                state: CycleState::Scheduled
            }
        );
    }

    #[test]
    fn iui_procedure_step_needs_type_step_and_progress() {
        let at_step = cycle()
            .with_status("InProgress")
            .with_treatment_type("IUI")
            .with_current_step("step4_iui_procedure");
        assert!(resolve_eligibility(&at_step, &SampleReadiness::default()).is_at_iui_procedure_step);

        let not_started = at_step.clone().with_status("Scheduled");
        assert!(!resolve_eligibility(&not_started, &SampleReadiness::default()).is_at_iui_procedure_step);

        let unknown_type = cycle()
            .with_status("InProgress")
            .with_current_step("step4_iui_procedure");
        assert!(!resolve_eligibility(&unknown_type, &SampleReadiness::default()).is_at_iui_procedure_step);
    }

    #[test]
    fn fertilization_step_uses_parent_type() {
        use crate::domain::cycle::Treatment;

        let parent = Treatment::new(TreatmentId::new(), PatientId::new()).with_treatment_type("ivf");
        let ctx = TypeContext::new(Some(&parent), &[]);
        let c = cycle()
            .with_status("in progress")
            .with_step_type("IVF_FERTILIZATION");

        let e = resolve_eligibility_in(&c, &ctx, &SampleReadiness::default());

        assert_eq!(e.cycle_type, Some(CycleType::Ivf));
        assert!(e.is_at_fertilization_step);
        assert!(!e.is_at_iui_procedure_step);
    }

    #[test]
    fn serializes_flags_for_the_portal() {
        let e = resolve_eligibility(&cycle().with_status("Scheduled"), &SampleReadiness::default());
        let json = serde_json::to_value(&e).unwrap();

        assert_eq!(json["canStart"], true);
        assert_eq!(json["isAtIUIProcedureStep"], false);
        assert_eq!(json["state"], "Scheduled");
    }

    fn any_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Planned".to_string()),
            Just("Scheduled".to_string()),
            Just("InProgress".to_string()),
            Just("Completed".to_string()),
            Just("Cancelled".to_string()),
            ".*",
        ]
    }

    proptest! {
        #[test]
        fn start_and_complete_are_mutually_exclusive(
            status in any_status(),
            number in proptest::option::of(1u32..6),
            ready in any::<bool>(),
        ) {
            let mut c = cycle().with_status(status.as_str());
            c.cycle_number = number;
            let readiness = if ready {
                SampleReadiness::not_required()
            } else {
                SampleReadiness::evaluate(&[sample(SampleKind::Sperm, "Collected")], &[])
            };

            let e = resolve_eligibility(&c, &readiness);

            prop_assert!(!(e.can_start && e.can_complete));
            prop_assert_eq!(e.can_complete, e.completion_blockers().is_empty());
        }
    }
}
