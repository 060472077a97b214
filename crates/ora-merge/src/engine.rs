//! Merge entrypoints
//!
//! Reduces a base artifact plus a bag of deltas to a new artifact. The
//! sole source of determinism is the stable sort on per-delta timestamp
//! strings: the same delta multiset, in any arrival order, produces the
//! same document and the same assigned ids.
//!
//! The base document is never mutated; application happens against a
//! private working copy, so the caller's reference stays valid for
//! comparison (e.g. diffing before/after).

use crate::apply::{apply_delta, ApplyOutcome};
use crate::report::{DeltaDisposition, MergeOutcome, MergeReport};
use chrono::{SecondsFormat, Utc};
use ora_artifact::Artifact;
use ora_delta::Delta;

/// A delta stamped with its acting agent and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedDelta {
    /// The change request
    pub delta: Delta,

    /// Acting agent id
    pub agent: String,

    /// Per-delta timestamp (ISO-8601)
    pub timestamp: String,
}

impl AttributedDelta {
    /// Stamp a delta with actor and timestamp
    #[inline]
    #[must_use]
    pub fn new(delta: Delta, agent: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            delta,
            agent: agent.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Merge deltas that all share one actor and timestamp
#[must_use]
pub fn merge(base: &Artifact, deltas: &[Delta], agent_id: &str, timestamp: &str) -> MergeOutcome {
    let attributed = deltas
        .iter()
        .cloned()
        .map(|delta| AttributedDelta::new(delta, agent_id, timestamp))
        .collect();
    merge_attributed(base, attributed)
}

/// Merge deltas shared-stamped with the current wall clock
#[must_use]
pub fn merge_now(base: &Artifact, deltas: &[Delta], agent_id: &str) -> MergeOutcome {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    merge(base, deltas, agent_id, &now)
}

/// Merge deltas that carry individual `(agent, timestamp)` attribution
///
/// Used when reconciling contributions from several actors at once.
#[must_use]
pub fn merge_attributed(base: &Artifact, deltas: Vec<AttributedDelta>) -> MergeOutcome {
    let mut ordered: Vec<(usize, AttributedDelta)> = deltas.into_iter().enumerate().collect();
    ordered.sort_by(|(_, a), (_, b)| a.timestamp.cmp(&b.timestamp));

    let mut working = base.clone();
    let mut report = MergeReport::default();
    let mut warnings = Vec::new();
    let mut latest_applied: Option<String> = None;

    for (input_index, attributed) in &ordered {
        let result = apply_delta(
            &mut working,
            &attributed.delta,
            &attributed.agent,
            &attributed.timestamp,
            &mut warnings,
        );

        match result {
            Ok(ApplyOutcome::Applied { section, id }) => {
                tracing::debug!(
                    section = %section,
                    id = %id,
                    agent = %attributed.agent,
                    "delta applied"
                );
                if latest_applied
                    .as_deref()
                    .map_or(true, |latest| attributed.timestamp.as_str() > latest)
                {
                    latest_applied = Some(attributed.timestamp.clone());
                }
                report.record(DeltaDisposition::Applied {
                    input_index: *input_index,
                    section,
                    id,
                });
            }
            Ok(ApplyOutcome::Skipped { section, id, note }) => {
                tracing::debug!(section = %section, id = %id, note = %note, "delta skipped");
                report.record(DeltaDisposition::Skipped {
                    input_index: *input_index,
                    section,
                    id,
                    note,
                });
            }
            Err(error) => {
                tracing::warn!(error = %error, "delta failed");
                report.record(DeltaDisposition::Failed {
                    input_index: *input_index,
                    error,
                });
            }
        }
    }

    working.metadata.version += 1;
    if let Some(timestamp) = &latest_applied {
        working.metadata.touch(timestamp);
    }
    for (_, attributed) in &ordered {
        working
            .metadata
            .upsert_contributor(&attributed.agent, &attributed.timestamp);
    }

    report.warnings = warnings;
    let success = report.failed_count == 0;
    MergeOutcome {
        artifact: working,
        success,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use ora_artifact::Section;
    use ora_delta::DeltaOp;
    use serde_json::json;

    fn add_hypothesis(name: &str) -> Delta {
        Delta {
            operation: DeltaOp::Add,
            section: Section::HypothesisSlate,
            target_id: None,
            payload: serde_json::from_value(json!({"name": name, "claim": "c"})).unwrap(),
            rationale: String::new(),
        }
    }

    #[test]
    fn merge_bumps_version_by_one() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let outcome = merge(&base, &[add_hypothesis("a")], "agent-a", "2026-01-02T00:00:00Z");

        assert!(outcome.success);
        assert_eq!(outcome.artifact.metadata.version, 1);
        assert_eq!(base.metadata.version, 0);
    }

    #[test]
    fn base_document_is_never_mutated() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let _ = merge(&base, &[add_hypothesis("a")], "agent-a", "2026-01-02T00:00:00Z");
        assert!(base.sections.hypothesis_slate.is_empty());
    }

    #[test]
    fn updated_at_tracks_latest_applied() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let deltas = vec![
            AttributedDelta::new(add_hypothesis("b"), "agent-b", "2026-01-05T00:00:00Z"),
            AttributedDelta::new(add_hypothesis("a"), "agent-a", "2026-01-03T00:00:00Z"),
        ];
        let outcome = merge_attributed(&base, deltas);

        assert_eq!(outcome.artifact.metadata.updated_at, "2026-01-05T00:00:00Z");
    }

    #[test]
    fn deltas_apply_in_timestamp_order() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let deltas = vec![
            AttributedDelta::new(add_hypothesis("second"), "a", "2026-01-04T00:00:00Z"),
            AttributedDelta::new(add_hypothesis("first"), "a", "2026-01-02T00:00:00Z"),
        ];
        let outcome = merge_attributed(&base, deltas);

        let slate = &outcome.artifact.sections.hypothesis_slate;
        assert_eq!(slate[0].name, "first");
        assert_eq!(slate[0].id, "H1");
        assert_eq!(slate[1].name, "second");
        assert_eq!(slate[1].id, "H2");
    }

    #[test]
    fn contributors_upsert_in_timestamp_order() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let deltas = vec![
            AttributedDelta::new(add_hypothesis("b"), "agent-b", "2026-01-04T00:00:00Z"),
            AttributedDelta::new(add_hypothesis("a"), "agent-a", "2026-01-02T00:00:00Z"),
        ];
        let outcome = merge_attributed(&base, deltas);

        let contributors = &outcome.artifact.metadata.contributors;
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].agent_id, "agent-a");
        assert_eq!(contributors[1].agent_id, "agent-b");
    }

    #[test]
    fn failure_reports_partial_application() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let bad_edit = Delta {
            operation: DeltaOp::Edit,
            section: Section::HypothesisSlate,
            target_id: Some("H99".to_string()),
            payload: IndexMap::new(),
            rationale: String::new(),
        };
        let deltas = vec![
            AttributedDelta::new(add_hypothesis("a"), "agent-a", "2026-01-02T00:00:00Z"),
            AttributedDelta::new(bad_edit, "agent-a", "2026-01-03T00:00:00Z"),
            AttributedDelta::new(add_hypothesis("b"), "agent-a", "2026-01-04T00:00:00Z"),
        ];
        let outcome = merge_attributed(&base, deltas);

        assert!(!outcome.success);
        assert!(outcome.adoptable().is_none());
        assert_eq!(outcome.report.applied_count, 2);
        assert_eq!(outcome.report.failed_count, 1);
    }

    #[test]
    fn empty_merge_still_versions() {
        let base = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let outcome = merge(&base, &[], "agent-a", "2026-01-02T00:00:00Z");
        assert!(outcome.success);
        assert_eq!(outcome.artifact.metadata.version, 1);
        assert_eq!(outcome.artifact.metadata.updated_at, "2026-01-01T00:00:00Z");
    }
}
