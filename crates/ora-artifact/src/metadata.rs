//! Artifact metadata: session identity, versioning, contributors

use crate::error::ArtifactError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Newly created, below minimums
    #[default]
    Draft,

    /// Under active contribution
    Active,

    /// Closed to further merges
    Closed,
}

/// One contributing agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Stable agent identifier
    pub agent_id: String,

    /// Tool the agent contributed through, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Model identifier, if the agent is automated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Timestamp of the most recent contribution
    pub last_contribution: String,
}

/// Session-level metadata for an artifact
///
/// # Invariants
/// - `version` increases by exactly 1 per merge call
/// - `updated_at` is monotonic non-decreasing
/// - `contributors` is ordered by first contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Session identifier
    pub session_id: String,

    /// Creation timestamp (ISO-8601)
    pub created_at: String,

    /// Last-merge timestamp (ISO-8601)
    pub updated_at: String,

    /// Monotonic merge counter, 0 for a fresh artifact
    pub version: u64,

    /// Agents that have contributed, in first-seen order
    #[serde(default)]
    pub contributors: Vec<Contributor>,

    /// Session lifecycle status
    #[serde(default)]
    pub status: SessionStatus,
}

impl ArtifactMetadata {
    /// Create metadata for a fresh version-0 artifact
    #[must_use]
    pub fn new(session_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            session_id: session_id.into(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 0,
            contributors: Vec::new(),
            status: SessionStatus::Draft,
        }
    }

    /// Record a contribution from `agent_id` at `timestamp`
    ///
    /// First-seen agents are appended; repeat contributors keep their slot
    /// and advance `last_contribution` to the greater of old and new.
    pub fn upsert_contributor(&mut self, agent_id: &str, timestamp: &str) {
        match self
            .contributors
            .iter_mut()
            .find(|c| c.agent_id == agent_id)
        {
            Some(existing) => {
                if timestamp > existing.last_contribution.as_str() {
                    existing.last_contribution = timestamp.to_string();
                }
            }
            None => self.contributors.push(Contributor {
                agent_id: agent_id.to_string(),
                tool: None,
                model: None,
                last_contribution: timestamp.to_string(),
            }),
        }
    }

    /// Advance `updated_at`, keeping it monotonic
    pub fn touch(&mut self, timestamp: &str) {
        if timestamp > self.updated_at.as_str() {
            self.updated_at = timestamp.to_string();
        }
    }
}

/// Parse an ISO-8601 timestamp string
///
/// # Errors
/// Returns [`ArtifactError::InvalidTimestamp`] if the string is not
/// RFC 3339 / ISO-8601.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ArtifactError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|_| ArtifactError::InvalidTimestamp(value.to_string()))
}
