//! The artifact root document

use crate::error::ArtifactError;
use crate::item::{
    self, Anomaly, Assumption, Critique, DiscriminativeTest, Hypothesis, Prediction,
    ResearchThread, SectionItem,
};
use crate::metadata::{ArtifactMetadata, SessionStatus};
use crate::section::{Section, SINGLETON_ID};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven section containers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    /// Singleton research question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_thread: Option<ResearchThread>,

    /// Competing hypotheses (≤ 6 active)
    #[serde(default)]
    pub hypothesis_slate: Vec<Hypothesis>,

    /// Prediction rows
    #[serde(default)]
    pub predictions_table: Vec<Prediction>,

    /// Scored tests, kept in descending total-score order
    #[serde(default)]
    pub discriminative_tests: Vec<DiscriminativeTest>,

    /// Assumptions and scale checks
    #[serde(default)]
    pub assumption_ledger: Vec<Assumption>,

    /// Unexplained observations
    #[serde(default)]
    pub anomaly_register: Vec<Anomaly>,

    /// Adversarial critiques
    #[serde(default)]
    pub adversarial_critique: Vec<Critique>,
}

/// The canonical research document
///
/// Created empty at version 0 and only ever mutated through the merge
/// engine; never deleted, only marked closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Session metadata
    pub metadata: ArtifactMetadata,

    /// The seven sections
    #[serde(default)]
    pub sections: Sections,
}

impl Artifact {
    /// Create an empty version-0 artifact
    #[must_use]
    pub fn new(session_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            metadata: ArtifactMetadata::new(session_id, timestamp),
            sections: Sections::default(),
        }
    }

    /// Create an empty artifact with a minted session id, stamped now
    #[must_use]
    pub fn new_session() -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        Self::new(Uuid::new_v4().to_string(), now)
    }

    /// Count of active (non-killed) items in a section
    #[must_use]
    pub fn active_count(&self, section: Section) -> usize {
        match section {
            Section::ResearchThread => usize::from(
                self.sections
                    .research_thread
                    .as_ref()
                    .is_some_and(|t| !t.killed()),
            ),
            Section::HypothesisSlate => item::active_count(&self.sections.hypothesis_slate),
            Section::PredictionsTable => item::active_count(&self.sections.predictions_table),
            Section::DiscriminativeTests => {
                item::active_count(&self.sections.discriminative_tests)
            }
            Section::AssumptionLedger => item::active_count(&self.sections.assumption_ledger),
            Section::AnomalyRegister => item::active_count(&self.sections.anomaly_register),
            Section::AdversarialCritique => {
                item::active_count(&self.sections.adversarial_critique)
            }
        }
    }

    /// Next id that would be minted for a section
    #[must_use]
    pub fn next_id(&self, section: Section) -> String {
        match section {
            Section::ResearchThread => SINGLETON_ID.to_string(),
            Section::HypothesisSlate => item::next_id(&self.sections.hypothesis_slate),
            Section::PredictionsTable => item::next_id(&self.sections.predictions_table),
            Section::DiscriminativeTests => item::next_id(&self.sections.discriminative_tests),
            Section::AssumptionLedger => item::next_id(&self.sections.assumption_ledger),
            Section::AnomalyRegister => item::next_id(&self.sections.anomaly_register),
            Section::AdversarialCritique => item::next_id(&self.sections.adversarial_critique),
        }
    }

    /// Close the session to further merges
    ///
    /// # Errors
    /// Returns [`ArtifactError::InvalidTransition`] if already closed.
    pub fn close(&mut self, timestamp: &str) -> Result<(), ArtifactError> {
        if self.metadata.status == SessionStatus::Closed {
            return Err(ArtifactError::InvalidTransition {
                from: "closed".to_string(),
                to: "closed".to_string(),
            });
        }
        self.metadata.status = SessionStatus::Closed;
        self.metadata.touch(timestamp);
        Ok(())
    }

    /// Reopen a closed session
    ///
    /// # Errors
    /// Returns [`ArtifactError::InvalidTransition`] unless currently closed.
    pub fn reopen(&mut self, timestamp: &str) -> Result<(), ArtifactError> {
        if self.metadata.status != SessionStatus::Closed {
            return Err(ArtifactError::InvalidTransition {
                from: "draft".to_string(),
                to: "active".to_string(),
            });
        }
        self.metadata.status = SessionStatus::Active;
        self.metadata.touch(timestamp);
        Ok(())
    }
}
