//! Merge outcome reporting
//!
//! A merge returns a [`MergeOutcome`]: the candidate document, a success
//! flag, and a [`MergeReport`] with one [`DeltaDisposition`] per input
//! delta. Warnings never block adoption; any hard [`MergeError`] marks the
//! whole outcome non-adoptable while the report still says exactly which
//! deltas landed.

use ora_artifact::{Artifact, Section};
use ora_delta::DeltaOp;
use serde::Serialize;

/// Advisory warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// A payload key on the pollution denylist was dropped
    ForbiddenKey,

    /// An EDIT targeted a killed item and was skipped
    TargetKilled,

    /// No active hypothesis is flagged as the third alternative
    NoThirdAlternative,

    /// No active assumption is flagged as a scale check
    NoScaleCheck,
}

/// An advisory warning attached to a merge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeWarning {
    /// Stable warning code
    pub code: WarningCode,

    /// Human-readable detail
    pub message: String,
}

impl MergeWarning {
    pub(crate) fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Hard apply-time errors
///
/// Any of these makes the merge outcome non-adoptable.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum MergeError {
    /// EDIT/KILL target does not exist in the section
    #[error("no item {target} in {section}")]
    TargetNotFound {
        /// Section searched
        section: Section,
        /// Missing id
        target: String,
    },

    /// ADD into a section already at its active capacity
    #[error("{section} is at capacity ({capacity} active items)")]
    SectionAtCapacity {
        /// Full section
        section: Section,
        /// Its capacity
        capacity: usize,
    },

    /// ADD/KILL aimed at the singleton section
    #[error("{operation} not allowed on singleton section {section}")]
    SingletonOperation {
        /// Offending operation
        operation: DeltaOp,
        /// The singleton section
        section: Section,
    },

    /// EDIT/KILL on a collection without a target id
    #[error("{operation} on {section} requires a target id")]
    MissingTarget {
        /// Offending operation
        operation: DeltaOp,
        /// Targeted section
        section: Section,
    },

    /// Payload fields do not fit the section's item shape
    #[error("payload does not fit {section}: {detail}")]
    PayloadShape {
        /// Targeted section
        section: Section,
        /// Deserialization detail
        detail: String,
    },
}

/// What happened to one delta
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeltaDisposition {
    /// Applied to the working document
    Applied {
        /// Position in the caller's input
        input_index: usize,
        /// Section touched
        section: Section,
        /// Item created, edited, or killed
        id: String,
    },

    /// Legal but deliberately not applied
    Skipped {
        /// Position in the caller's input
        input_index: usize,
        /// Section touched
        section: Section,
        /// Target item
        id: String,
        /// Why it was skipped
        note: String,
    },

    /// Hit a hard error
    Failed {
        /// Position in the caller's input
        input_index: usize,
        /// The error
        error: MergeError,
    },
}

/// Per-delta accounting for one merge call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// One entry per input delta, in application (timestamp) order
    pub dispositions: Vec<DeltaDisposition>,

    /// Advisory warnings raised during application
    pub warnings: Vec<MergeWarning>,

    /// Deltas applied
    pub applied_count: usize,

    /// Deltas skipped (killed-target edits, idempotent re-kills)
    pub skipped_count: usize,

    /// Deltas that hit hard errors
    pub failed_count: usize,
}

impl MergeReport {
    pub(crate) fn record(&mut self, disposition: DeltaDisposition) {
        match &disposition {
            DeltaDisposition::Applied { .. } => self.applied_count += 1,
            DeltaDisposition::Skipped { .. } => self.skipped_count += 1,
            DeltaDisposition::Failed { .. } => self.failed_count += 1,
        }
        self.dispositions.push(disposition);
    }

    /// Errors from failed deltas, in application order
    pub fn errors(&self) -> impl Iterator<Item = &MergeError> {
        self.dispositions.iter().filter_map(|d| match d {
            DeltaDisposition::Failed { error, .. } => Some(error),
            _ => None,
        })
    }
}

/// Result of a merge call
///
/// A failed merge still carries the partially-applied document for
/// diagnostics; callers must not adopt it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// The candidate document
    pub artifact: Artifact,

    /// True iff no delta hit a hard error
    pub success: bool,

    /// Per-delta accounting
    pub report: MergeReport,
}

impl MergeOutcome {
    /// The new document, only if the merge may be adopted
    #[inline]
    #[must_use]
    pub fn adoptable(&self) -> Option<&Artifact> {
        self.success.then_some(&self.artifact)
    }
}
