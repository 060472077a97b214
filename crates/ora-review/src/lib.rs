//! ORA Review Tools
//!
//! Two independent read-only views over a completed artifact, plus the
//! semantic differ. Nothing here mutates a document.
//!
//! # Core Concepts
//!
//! - [`validate_artifact`]: lightweight missing-minimums check
//! - [`lint_artifact`]: severity-ranked, rule-coded report ([`LintReport`])
//! - [`diff_artifacts`]: structured change lists between two versions
//!   ([`ArtifactDiff`]) with a coarse [`ProgressScore`]
//!
//! Findings are advisory by design: a session may persist below minimums
//! or in an error state. Linting gates promotion, not saving.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod citation;
mod diff;
mod lint;
mod validate;

pub use citation::{extract_citations, extract_hypothesis_ids, is_inference_marker, Citation};
pub use diff::{
    diff_artifacts, AddedItem, AnomalyOutcome, AnomalyResolution, ArtifactDiff, DiffOptions,
    DiffSummary, EditedItem, FieldChange, KilledItem, ProgressScore, SectionChanges,
};
pub use lint::{lint_artifact, LintConfig, LintReport, LintSummary, Severity, Violation};
pub use validate::{
    validate_artifact, ValidationCode, ValidationWarning, REFERENCE_RELATIONS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
