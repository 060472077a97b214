//! Missing-minimums validation
//!
//! The lightweight view over a completed artifact: section floors,
//! required methodology markers, and structural checks on cross-session
//! references. Findings are advisory; a session may persist below
//! minimums.

use ora_artifact::{active, active_count, Artifact, SectionItem};
use serde::Serialize;
use serde_json::Value;

/// Closed set of relations a cross-session reference may carry
pub const REFERENCE_RELATIONS: [&str; 5] =
    ["supports", "refutes", "extends", "duplicates", "depends_on"];

/// Validation warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// Fewer than 3 active hypotheses
    MinHypotheses,

    /// Fewer than 3 active predictions
    MinPredictions,

    /// Fewer than 2 active tests
    MinTests,

    /// Fewer than 3 active assumptions
    MinAssumptions,

    /// Fewer than 2 active critiques
    MinCritiques,

    /// No active hypothesis flagged as the third alternative
    NoThirdAlternative,

    /// No active assumption flagged as a scale check
    NoScaleCheck,

    /// No active critique flagged as a real third alternative
    NoRealThirdAlternative,

    /// A cross-session reference is structurally malformed
    InvalidReference,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    /// Stable code
    pub code: ValidationCode,

    /// Human-readable detail
    pub message: String,
}

impl ValidationWarning {
    fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn check_reference(item_id: &str, index: usize, reference: &Value) -> Option<ValidationWarning> {
    let warn = |part: &str| {
        Some(ValidationWarning::new(
            ValidationCode::InvalidReference,
            format!("{item_id} reference #{index}: {part}"),
        ))
    };

    let Value::Object(map) = reference else {
        return warn("not an object");
    };

    match map.get("session") {
        Some(Value::String(s)) if !s.is_empty() => {}
        _ => return warn("missing or empty 'session'"),
    }
    match map.get("item") {
        Some(Value::String(s)) if !s.is_empty() => {}
        _ => return warn("missing or empty 'item'"),
    }
    match map.get("relation") {
        Some(Value::String(relation)) if REFERENCE_RELATIONS.contains(&relation.as_str()) => None,
        Some(Value::String(relation)) => warn(&format!("unknown relation '{relation}'")),
        _ => warn("missing 'relation'"),
    }
}

fn check_item_references<T: SectionItem>(items: &[T], warnings: &mut Vec<ValidationWarning>) {
    for item in items {
        let Some(references) = item.extra().get("references") else {
            continue;
        };
        let Value::Array(references) = references else {
            warnings.push(ValidationWarning::new(
                ValidationCode::InvalidReference,
                format!("{}: 'references' is not a list", item.id()),
            ));
            continue;
        };
        for (index, reference) in references.iter().enumerate() {
            if let Some(warning) = check_reference(item.id(), index, reference) {
                warnings.push(warning);
            }
        }
    }
}

/// Check an artifact for missing minimums and malformed references
#[must_use]
pub fn validate_artifact(artifact: &Artifact) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let sections = &artifact.sections;

    let floors = [
        (
            ValidationCode::MinHypotheses,
            active_count(&sections.hypothesis_slate),
            3,
            "hypotheses",
        ),
        (
            ValidationCode::MinPredictions,
            active_count(&sections.predictions_table),
            3,
            "predictions",
        ),
        (
            ValidationCode::MinTests,
            active_count(&sections.discriminative_tests),
            2,
            "discriminative tests",
        ),
        (
            ValidationCode::MinAssumptions,
            active_count(&sections.assumption_ledger),
            3,
            "assumptions",
        ),
        (
            ValidationCode::MinCritiques,
            active_count(&sections.adversarial_critique),
            2,
            "critiques",
        ),
    ];
    for (code, have, need, noun) in floors {
        if have < need {
            warnings.push(ValidationWarning::new(
                code,
                format!("need at least {need} active {noun}, have {have}"),
            ));
        }
    }

    if !active(&sections.hypothesis_slate).any(|h| h.third_alternative) {
        warnings.push(ValidationWarning::new(
            ValidationCode::NoThirdAlternative,
            "no active hypothesis is flagged as the third alternative",
        ));
    }
    if !active(&sections.assumption_ledger).any(|a| a.scale_check) {
        warnings.push(ValidationWarning::new(
            ValidationCode::NoScaleCheck,
            "no active assumption is flagged as a scale check",
        ));
    }
    if !active(&sections.adversarial_critique).any(|c| c.real_third_alternative) {
        warnings.push(ValidationWarning::new(
            ValidationCode::NoRealThirdAlternative,
            "no active critique is flagged as a real third alternative",
        ));
    }

    if let Some(thread) = &sections.research_thread {
        check_item_references(std::slice::from_ref(thread), &mut warnings);
    }
    check_item_references(&sections.hypothesis_slate, &mut warnings);
    check_item_references(&sections.predictions_table, &mut warnings);
    check_item_references(&sections.discriminative_tests, &mut warnings);
    check_item_references(&sections.assumption_ledger, &mut warnings);
    check_item_references(&sections.anomaly_register, &mut warnings);
    check_item_references(&sections.adversarial_critique, &mut warnings);

    warnings
}
