//! Treatment type inference for cycles.
//!
//! A cycle's type is resolved by trying an ordered list of extractors; the
//! first one that yields a type wins:
//!
//! 1. [`from_cycle_field`] - the cycle's own `treatmentType`, exactly "IUI" or "IVF"
//! 2. [`from_parent_treatment`] - the parent treatment's type, any casing
//! 3. [`from_cycle_name`] - "IVF" or "IUI" appearing in the cycle name
//! 4. [`from_siblings`] - the first other cycle of the same treatment that
//!    resolves through rules 1-3
//!
//! If none applies the type is unknown and callers must not assume one.

use serde::{Deserialize, Serialize};

use super::record::{Cycle, Treatment};
use crate::domain::foundation::CycleType;

/// Related records consulted when the cycle alone is not conclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeContext<'a> {
    pub parent: Option<&'a Treatment>,
    /// Cycles of the same treatment. The cycle itself may be included.
    pub siblings: &'a [Cycle],
}

impl<'a> TypeContext<'a> {
    pub fn new(parent: Option<&'a Treatment>, siblings: &'a [Cycle]) -> Self {
        Self { parent, siblings }
    }
}

/// Which extractor produced an inferred type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSource {
    CycleField,
    ParentTreatment,
    CycleName,
    Sibling,
}

/// An inferred type together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInference {
    pub cycle_type: CycleType,
    pub source: TypeSource,
}

type Extractor = fn(&Cycle, &TypeContext<'_>) -> Option<CycleType>;

/// Extractors in precedence order.
pub const TYPE_EXTRACTORS: [(TypeSource, Extractor); 4] = [
    (TypeSource::CycleField, from_cycle_field),
    (TypeSource::ParentTreatment, from_parent_treatment),
    (TypeSource::CycleName, from_cycle_name),
    (TypeSource::Sibling, from_siblings),
];

/// The cycle's own field, only when it is exactly "IUI" or "IVF".
pub fn from_cycle_field(cycle: &Cycle, _ctx: &TypeContext<'_>) -> Option<CycleType> {
    match cycle.treatment_type.as_deref() {
        Some("IUI") => Some(CycleType::Iui),
        Some("IVF") => Some(CycleType::Ivf),
        _ => None,
    }
}

/// The parent treatment's type, parsed case-insensitively.
pub fn from_parent_treatment(_cycle: &Cycle, ctx: &TypeContext<'_>) -> Option<CycleType> {
    ctx.parent
        .and_then(Treatment::parsed_type)
        .and_then(|t| t.cycle_type())
}

/// "IVF" anywhere in the uppercased name, else "IUI".
pub fn from_cycle_name(cycle: &Cycle, _ctx: &TypeContext<'_>) -> Option<CycleType> {
    let name = cycle.cycle_name.as_deref()?.to_uppercase();
    if name.contains("IVF") {
        Some(CycleType::Ivf)
    } else if name.contains("IUI") {
        Some(CycleType::Iui)
    } else {
        None
    }
}

/// The first sibling whose own type resolves through the first three rules.
pub fn from_siblings(cycle: &Cycle, ctx: &TypeContext<'_>) -> Option<CycleType> {
    ctx.siblings
        .iter()
        .filter(|sibling| sibling.id != cycle.id)
        .find_map(|sibling| {
            TYPE_EXTRACTORS
                .iter()
                .filter(|(source, _)| *source != TypeSource::Sibling)
                .find_map(|(_, extract)| extract(sibling, ctx))
        })
}

/// Infers the type and reports which rule decided it.
pub fn infer_treatment_type_with_source(
    cycle: &Cycle,
    ctx: &TypeContext<'_>,
) -> Option<TypeInference> {
    TYPE_EXTRACTORS.iter().find_map(|(source, extract)| {
        extract(cycle, ctx).map(|cycle_type| TypeInference {
            cycle_type,
            source: *source,
        })
    })
}

/// Infers whether a cycle belongs to an IUI or IVF treatment.
pub fn infer_treatment_type(cycle: &Cycle, ctx: &TypeContext<'_>) -> Option<CycleType> {
    infer_treatment_type_with_source(cycle, ctx).map(|inference| inference.cycle_type)
}
