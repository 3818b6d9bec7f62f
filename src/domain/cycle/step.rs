//! Clinical step detection.
//!
//! Whether a cycle represents a given clinical step is decided by four
//! independent signals, any one of which is sufficient:
//!
//! 1. the cycle's ordinal position, for steps that always sit at the same
//!    position within a treatment of one type;
//! 2. the `stepType` code;
//! 3. the `currentStep` code;
//! 4. keywords in the cycle name.
//!
//! Records in the backend carry different subsets of these fields, so every
//! signal is consulted. The name keywords are a workaround for older records
//! and live only in [`StepSignature::name_rules`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::Cycle;
use crate::domain::foundation::CycleType;

/// Fine-grained step codes used by the backend's `currentStep` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrentStep {
    #[serde(rename = "step1_consultation")]
    Step1Consultation,
    #[serde(rename = "step2_stimulation")]
    Step2Stimulation,
    #[serde(rename = "step3_trigger")]
    Step3Trigger,
    #[serde(rename = "step4_opu")]
    Step4Opu,
    #[serde(rename = "step4_iui_procedure")]
    Step4IuiProcedure,
    #[serde(rename = "step5_fertilization")]
    Step5Fertilization,
    #[serde(rename = "step5_post_iui")]
    Step5PostIui,
    #[serde(rename = "step6_embryo_transfer")]
    Step6EmbryoTransfer,
}

impl CurrentStep {
    const ALL: [CurrentStep; 8] = [
        CurrentStep::Step1Consultation,
        CurrentStep::Step2Stimulation,
        CurrentStep::Step3Trigger,
        CurrentStep::Step4Opu,
        CurrentStep::Step4IuiProcedure,
        CurrentStep::Step5Fertilization,
        CurrentStep::Step5PostIui,
        CurrentStep::Step6EmbryoTransfer,
    ];

    /// Backend code for this step.
    pub fn code(&self) -> &'static str {
        match self {
            CurrentStep::Step1Consultation => "step1_consultation",
            CurrentStep::Step2Stimulation => "step2_stimulation",
            CurrentStep::Step3Trigger => "step3_trigger",
            CurrentStep::Step4Opu => "step4_opu",
            CurrentStep::Step4IuiProcedure => "step4_iui_procedure",
            CurrentStep::Step5Fertilization => "step5_fertilization",
            CurrentStep::Step5PostIui => "step5_post_iui",
            CurrentStep::Step6EmbryoTransfer => "step6_embryo_transfer",
        }
    }

    /// Parses a backend code, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.code().eq_ignore_ascii_case(raw))
    }
}

/// Clinical steps that gate portal actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalStep {
    /// IVF oocyte pick-up and sperm collection.
    IvfCollection,
    /// IUI insemination procedure.
    IuiInsemination,
    /// IVF fertilization in the lab.
    Fertilization,
    /// Follow-up after an IUI procedure.
    PostIui,
}

/// Every signal that identifies one clinical step.
#[derive(Debug)]
pub struct StepSignature {
    /// Fixed 1-based cycle position, if the step always sits there.
    pub ordinal: Option<u32>,
    /// Treatment type the position applies to. Cycles known to be of
    /// another type never match on position.
    pub ordinal_type: Option<CycleType>,
    /// `stepType` codes, compared case-insensitively.
    pub step_types: &'static [&'static str],
    pub current_steps: &'static [CurrentStep],
    /// Name keyword rules: a rule matches when every keyword in it occurs in
    /// the lowercased name; the step matches when any rule does.
    pub name_rules: &'static [&'static [&'static str]],
}

static IVF_COLLECTION: StepSignature = StepSignature {
    ordinal: Some(3),
    ordinal_type: Some(CycleType::Ivf),
    step_types: &["IVF_OPU", "IVF_COLLECTION"],
    current_steps: &[CurrentStep::Step4Opu],
    name_rules: &[
        &["oocyte retrieval"],
        &["egg retrieval"],
        &["sperm collection"],
        &["opu", "cycle"],
    ],
};

static IUI_INSEMINATION: StepSignature = StepSignature {
    ordinal: None,
    ordinal_type: None,
    step_types: &["IUI_PROCEDURE"],
    current_steps: &[CurrentStep::Step4IuiProcedure],
    name_rules: &[&["iui procedure"], &["insemination"]],
};

static FERTILIZATION: StepSignature = StepSignature {
    ordinal: None,
    ordinal_type: None,
    step_types: &["IVF_FERTILIZATION"],
    current_steps: &[CurrentStep::Step5Fertilization],
    name_rules: &[&["fertilization"], &["fertilisation"], &["icsi"]],
};

static POST_IUI: StepSignature = StepSignature {
    ordinal: None,
    ordinal_type: None,
    step_types: &["IUI_POST"],
    current_steps: &[CurrentStep::Step5PostIui],
    name_rules: &[&["post-iui"], &["post iui"]],
};

impl ClinicalStep {
    pub const ALL: [ClinicalStep; 4] = [
        ClinicalStep::IvfCollection,
        ClinicalStep::IuiInsemination,
        ClinicalStep::Fertilization,
        ClinicalStep::PostIui,
    ];

    /// Stable string id used by the presentation layer.
    pub fn id(&self) -> &'static str {
        match self {
            ClinicalStep::IvfCollection => "ivf_collection_step",
            ClinicalStep::IuiInsemination => "iui_insemination_step",
            ClinicalStep::Fertilization => "fertilization_step",
            ClinicalStep::PostIui => "post_iui_step",
        }
    }

    /// Resolves a string id back to a step.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.id() == id)
    }

    pub fn signature(&self) -> &'static StepSignature {
        match self {
            ClinicalStep::IvfCollection => &IVF_COLLECTION,
            ClinicalStep::IuiInsemination => &IUI_INSEMINATION,
            ClinicalStep::Fertilization => &FERTILIZATION,
            ClinicalStep::PostIui => &POST_IUI,
        }
    }
}

impl fmt::Display for ClinicalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl StepSignature {
    /// Position signal. `cycle_type` is the inferred type, if any; a known
    /// type other than `ordinal_type` rules the position out.
    pub fn matches_ordinal(&self, cycle: &Cycle, cycle_type: Option<CycleType>) -> bool {
        let type_allows = match (self.ordinal_type, cycle_type) {
            (Some(want), Some(got)) => want == got,
            _ => true,
        };
        type_allows
            && matches!((self.ordinal, cycle.cycle_number), (Some(want), Some(got)) if want == got)
    }

    pub fn matches_step_type(&self, cycle: &Cycle) -> bool {
        cycle.step_type.as_deref().is_some_and(|raw| {
            let raw = raw.trim();
            self.step_types.iter().any(|code| code.eq_ignore_ascii_case(raw))
        })
    }

    pub fn matches_current_step(&self, cycle: &Cycle) -> bool {
        cycle
            .current_step
            .as_deref()
            .and_then(CurrentStep::parse)
            .is_some_and(|step| self.current_steps.contains(&step))
    }

    pub fn matches_name(&self, cycle: &Cycle) -> bool {
        let Some(name) = cycle.cycle_name.as_deref() else {
            return false;
        };
        let name = name.to_lowercase();
        self.name_rules
            .iter()
            .any(|rule| rule.iter().all(|keyword| name.contains(*keyword)))
    }

    /// True when any signal identifies the step.
    pub fn matches(&self, cycle: &Cycle, cycle_type: Option<CycleType>) -> bool {
        self.matches_ordinal(cycle, cycle_type)
            || self.matches_step_type(cycle)
            || self.matches_current_step(cycle)
            || self.matches_name(cycle)
    }
}

/// Returns true if the cycle currently represents the given clinical step.
///
/// The type is not known here, so position signals always count.
pub fn is_at_step(cycle: &Cycle, step: ClinicalStep) -> bool {
    is_at_step_as(cycle, step, None)
}

/// Like [`is_at_step`], with the cycle's inferred treatment type.
pub fn is_at_step_as(cycle: &Cycle, step: ClinicalStep, cycle_type: Option<CycleType>) -> bool {
    step.signature().matches(cycle, cycle_type)
}
