//! Delta wire types and shape validation
//!
//! A [`Delta`] is an external, not-yet-applied change request. Shape
//! validation checks everything that can be known without the document:
//! operation/section membership and target-id presence rules. Document
//! state (does the target exist, is the section full) is the merge
//! engine's concern.

use indexmap::IndexMap;
use ora_artifact::{Section, SINGLETON_ID};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The three delta operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeltaOp {
    /// Append a new item to a collection section
    Add,

    /// Update an existing item, or create-or-update the singleton
    Edit,

    /// Soft-delete an item, with a required reason
    Kill,
}

impl Display for DeltaOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeltaOp::Add => "ADD",
            DeltaOp::Edit => "EDIT",
            DeltaOp::Kill => "KILL",
        };
        f.write_str(name)
    }
}

impl FromStr for DeltaOp {
    type Err = DeltaShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(DeltaOp::Add),
            "EDIT" => Ok(DeltaOp::Edit),
            "KILL" => Ok(DeltaOp::Kill),
            other => Err(DeltaShapeError::UnknownOperation(other.to_string())),
        }
    }
}

/// A validated change request
///
/// # Invariants (enforced by [`validate_shape`])
/// - ADD never carries a target id
/// - KILL always carries a target id and a string `payload.reason`
/// - The singleton section only accepts EDIT, targeted by `RT` or nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// What to do
    pub operation: DeltaOp,

    /// Which section to do it to
    pub section: Section,

    /// Target item id (rules depend on `operation`)
    #[serde(default)]
    pub target_id: Option<String>,

    /// Proposed field values
    #[serde(default)]
    pub payload: IndexMap<String, Value>,

    /// Contributor's free-text justification
    #[serde(default)]
    pub rationale: String,
}

/// A delta block that failed parsing or shape validation
///
/// Carries the original raw text for debugging; never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidDelta {
    /// Raw block body as found in the input
    pub raw: String,

    /// Human-readable rejection reason
    pub reason: String,
}

/// Shape-validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaShapeError {
    /// No `operation` field
    #[error("missing operation")]
    MissingOperation,

    /// Operation not one of ADD/EDIT/KILL
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// No `section` field
    #[error("missing section")]
    MissingSection,

    /// Section not one of the seven names
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// ADD must not carry a target id
    #[error("{operation} forbids target_id")]
    TargetForbidden {
        /// Offending operation
        operation: DeltaOp,
    },

    /// EDIT/KILL on a collection requires a target id
    #[error("{operation} requires target_id")]
    TargetRequired {
        /// Offending operation
        operation: DeltaOp,
    },

    /// KILL payload must carry a string `reason`
    #[error("KILL requires a string payload.reason")]
    KillReasonMissing,

    /// The singleton only accepts EDIT
    #[error("{operation} not allowed on research_thread (use EDIT)")]
    SingletonOperation {
        /// Offending operation
        operation: DeltaOp,
    },

    /// Singleton target id must be the sentinel
    #[error("research_thread target must be {SINGLETON_ID}, got {0}")]
    SingletonTarget(String),
}

/// Loosely-typed delta as it comes off the wire
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDelta {
    #[serde(default)]
    pub(crate) operation: Option<String>,
    #[serde(default)]
    pub(crate) section: Option<String>,
    #[serde(default)]
    pub(crate) target_id: Option<String>,
    #[serde(default)]
    pub(crate) payload: IndexMap<String, Value>,
    #[serde(default)]
    pub(crate) rationale: String,
}

/// Validate a raw delta's shape against the operation/section rules
///
/// # Errors
/// Returns the first [`DeltaShapeError`] encountered; callers surface it as
/// an [`InvalidDelta`] rather than aborting.
pub(crate) fn validate_shape(raw: RawDelta) -> Result<Delta, DeltaShapeError> {
    let operation = raw
        .operation
        .as_deref()
        .ok_or(DeltaShapeError::MissingOperation)?
        .parse::<DeltaOp>()?;

    let section_name = raw.section.as_deref().ok_or(DeltaShapeError::MissingSection)?;
    let section = section_name
        .parse::<Section>()
        .map_err(|_| DeltaShapeError::UnknownSection(section_name.to_string()))?;

    let target_id = raw.target_id.filter(|t| !t.is_empty());

    if section.is_singleton() {
        if operation != DeltaOp::Edit {
            return Err(DeltaShapeError::SingletonOperation { operation });
        }
        if let Some(target) = &target_id {
            if target != SINGLETON_ID {
                return Err(DeltaShapeError::SingletonTarget(target.clone()));
            }
        }
    } else {
        match operation {
            DeltaOp::Add => {
                if target_id.is_some() {
                    return Err(DeltaShapeError::TargetForbidden { operation });
                }
            }
            DeltaOp::Edit | DeltaOp::Kill => {
                if target_id.is_none() {
                    return Err(DeltaShapeError::TargetRequired { operation });
                }
            }
        }
    }

    if operation == DeltaOp::Kill
        && !matches!(raw.payload.get("reason"), Some(Value::String(_)))
    {
        return Err(DeltaShapeError::KillReasonMissing);
    }

    Ok(Delta {
        operation,
        section,
        target_id,
        payload: raw.payload,
        rationale: raw.rationale,
    })
}
