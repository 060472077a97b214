//! Section identity for research artifacts
//!
//! Provides [`Section`], the closed set of seven artifact sections, with
//! their wire names, id prefixes, and capacity rules.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Fixed id of the research-thread singleton.
///
/// The singleton is addressed by its prefix alone; it never carries a
/// numeric suffix.
pub const SINGLETON_ID: &str = "RT";

/// Hard capacity of the hypothesis slate (active items).
pub const HYPOTHESIS_CAPACITY: usize = 6;

/// One of the seven fixed artifact sections
///
/// Sections are part of the wire contract: their snake_case names appear in
/// delta payloads and their prefixes in item ids.
///
/// # Invariants
/// - Exactly one section ([`Section::ResearchThread`]) is a singleton
/// - Exactly one section ([`Section::HypothesisSlate`]) has a capacity limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// The research question under investigation (singleton)
    ResearchThread,

    /// Competing hypotheses, at most six active
    HypothesisSlate,

    /// Rows of per-hypothesis expected observations
    PredictionsTable,

    /// Tests scored for their power to separate hypotheses
    DiscriminativeTests,

    /// Explicit assumptions, including scale checks
    AssumptionLedger,

    /// Observations that do not fit any current hypothesis
    AnomalyRegister,

    /// Adversarial critiques of the current slate
    AdversarialCritique,
}

impl Section {
    /// All sections, in canonical document order
    pub const ALL: [Section; 7] = [
        Section::ResearchThread,
        Section::HypothesisSlate,
        Section::PredictionsTable,
        Section::DiscriminativeTests,
        Section::AssumptionLedger,
        Section::AnomalyRegister,
        Section::AdversarialCritique,
    ];

    /// Wire name as used in delta payloads
    #[inline]
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Section::ResearchThread => "research_thread",
            Section::HypothesisSlate => "hypothesis_slate",
            Section::PredictionsTable => "predictions_table",
            Section::DiscriminativeTests => "discriminative_tests",
            Section::AssumptionLedger => "assumption_ledger",
            Section::AnomalyRegister => "anomaly_register",
            Section::AdversarialCritique => "adversarial_critique",
        }
    }

    /// Fixed id prefix for items in this section
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Section::ResearchThread => "RT",
            Section::HypothesisSlate => "H",
            Section::PredictionsTable => "P",
            Section::DiscriminativeTests => "T",
            Section::AssumptionLedger => "A",
            Section::AnomalyRegister => "X",
            Section::AdversarialCritique => "C",
        }
    }

    /// Whether this section holds at most one item
    #[inline]
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Section::ResearchThread)
    }

    /// Active-item capacity, if this section has one
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Section::HypothesisSlate => Some(HYPOTHESIS_CAPACITY),
            _ => None,
        }
    }

    /// Build an item id from a numeric suffix (`H` + 3 → `H3`)
    #[inline]
    #[must_use]
    pub fn make_id(&self, suffix: u64) -> String {
        format!("{}{}", self.prefix(), suffix)
    }

    /// Extract the numeric suffix of an id belonging to this section
    ///
    /// Returns `None` if the prefix does not match or the remainder is not
    /// a decimal integer.
    #[must_use]
    pub fn id_suffix(&self, id: &str) -> Option<u64> {
        let rest = id.strip_prefix(self.prefix())?;
        if rest.is_empty() {
            return None;
        }
        rest.parse().ok()
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Section {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .find(|section| section.wire_name() == s)
            .copied()
            .ok_or_else(|| ArtifactError::UnknownSection(s.to_string()))
    }
}
