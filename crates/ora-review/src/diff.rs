//! Semantic diff between two artifact versions
//!
//! Computes per-section added/killed/edited change lists between two
//! causally related snapshots, plus section-specific classifications
//! (hypothesis net change, test targets, critique resolutions, anomaly
//! promotions) and a coarse progress score. Diffing never consults how
//! the versions were produced.

use crate::citation::extract_hypothesis_ids;
use indexmap::IndexMap;
use ora_artifact::{Artifact, Section, SectionItem, SYSTEM_FIELDS};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

const VALUE_TRUNCATE: usize = 80;

/// Policy knobs for diffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Treat items silently absent from the newer version as killed
    /// (synthetic rationale "Removed from artifact"). When false such
    /// items are reported under `removed` instead.
    pub implicit_kill: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { implicit_kill: true }
    }
}

/// Coarse progress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressScore {
    None,
    Minimal,
    Good,
    Excellent,
}

/// One field-level difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Field name
    pub field: String,

    /// Prior value, truncated for readability
    pub old_value: String,

    /// New value, truncated for readability
    pub new_value: String,
}

/// An item present only in the newer version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedItem {
    /// Item id
    pub id: String,

    /// Best-effort display label
    pub label: String,

    /// Hypothesis ids a discriminative test separates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

/// An item killed (or silently removed) between versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KilledItem {
    /// Item id
    pub id: String,

    /// Kill rationale
    pub reason: String,

    /// Who killed it, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
}

/// An item edited between versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditedItem {
    /// Item id
    pub id: String,

    /// Differing non-system fields
    pub fields: Vec<FieldChange>,
}

/// How a resolved anomaly was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyResolution {
    /// Promoted into (or toward) a hypothesis
    Promoted {
        /// The mentioned hypothesis id, or the word "hypothesis"
        target: String,
    },

    /// Resolved without promotion
    Dismissed,
}

/// A resolved anomaly and its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyOutcome {
    /// Anomaly id
    pub id: String,

    /// Promotion classification
    #[serde(flatten)]
    pub resolution: AnomalyResolution,
}

/// Changes within one section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionChanges {
    /// Present in the newer version only, not killed
    pub added: Vec<AddedItem>,

    /// Killed between versions (explicitly, or silently removed)
    pub killed: Vec<KilledItem>,

    /// Present in both with differing non-system fields
    pub edited: Vec<EditedItem>,

    /// Silently removed items, when `implicit_kill` is off
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,

    /// Hypothesis slate only: added − killed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_change: Option<i64>,

    /// Critique section only: ids newly resolved/addressed/fixed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Vec<String>>,

    /// Anomaly section only: newly resolved anomalies, classified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<Vec<AnomalyOutcome>>,
}

impl SectionChanges {
    fn is_quiet(&self) -> bool {
        self.added.is_empty()
            && self.killed.is_empty()
            && self.edited.is_empty()
            && self.removed.is_empty()
    }
}

/// Aggregate counts and the progress classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub hypotheses_added: usize,
    pub hypotheses_killed: usize,
    pub net_hypotheses: i64,
    pub tests_added: usize,
    pub critiques_resolved: usize,
    pub anomalies_resolved: usize,
    pub items_edited: usize,

    /// Coarse progress classification, advisory only
    pub progress_score: ProgressScore,
}

/// Structured diff between two versions of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactDiff {
    /// Version of the older snapshot
    pub from_version: u64,

    /// Version of the newer snapshot
    pub to_version: u64,

    /// Per-section changes, in canonical section order
    pub changes: IndexMap<String, SectionChanges>,

    /// Aggregate counts and progress
    pub summary: DiffSummary,
}

fn truncate_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.chars().count() <= VALUE_TRUNCATE {
        rendered
    } else {
        let cut: String = rendered.chars().take(VALUE_TRUNCATE - 3).collect();
        format!("{cut}...")
    }
}

fn label_of(map: &serde_json::Map<String, Value>, id: &str) -> String {
    for key in ["name", "statement", "observable", "description", "critique", "claim"] {
        if let Some(Value::String(s)) = map.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }
    id.to_string()
}

fn field_changes<T: SectionItem>(before: &T, after: &T) -> Vec<FieldChange> {
    let old_map = before.as_field_map();
    let new_map = after.as_field_map();
    let mut changes = Vec::new();

    for (key, new_value) in &new_map {
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match old_map.get(key) {
            Some(old_value) if old_value == new_value => {}
            Some(old_value) => changes.push(FieldChange {
                field: key.clone(),
                old_value: truncate_value(old_value),
                new_value: truncate_value(new_value),
            }),
            None => changes.push(FieldChange {
                field: key.clone(),
                old_value: String::new(),
                new_value: truncate_value(new_value),
            }),
        }
    }
    for (key, old_value) in &old_map {
        if SYSTEM_FIELDS.contains(&key.as_str()) || new_map.contains_key(key) {
            continue;
        }
        changes.push(FieldChange {
            field: key.clone(),
            old_value: truncate_value(old_value),
            new_value: String::new(),
        });
    }

    changes
}

fn diff_items<T: SectionItem>(before: &[T], after: &[T], options: &DiffOptions) -> SectionChanges {
    let mut changes = SectionChanges::default();

    for item in after {
        if item.killed() {
            continue;
        }
        if ora_artifact::find_by_id(before, item.id()).is_none() {
            let map = item.as_field_map();
            let targets = (T::SECTION == Section::DiscriminativeTests)
                .then(|| match map.get("discriminates") {
                    Some(Value::String(s)) => extract_hypothesis_ids(s),
                    _ => Vec::new(),
                });
            changes.added.push(AddedItem {
                id: item.id().to_string(),
                label: label_of(&map, item.id()),
                targets,
            });
        }
    }

    for old in before {
        match ora_artifact::find_by_id(after, old.id()) {
            Some(new) => {
                if new.killed() && !old.killed() {
                    changes.killed.push(KilledItem {
                        id: old.id().to_string(),
                        reason: new.kill_reason().unwrap_or("").to_string(),
                        killed_by: new.killed_by().map(String::from),
                    });
                } else if !new.killed() {
                    let fields = field_changes(old, new);
                    if !fields.is_empty() {
                        changes.edited.push(EditedItem {
                            id: old.id().to_string(),
                            fields,
                        });
                    }
                }
            }
            None => {
                if options.implicit_kill {
                    changes.killed.push(KilledItem {
                        id: old.id().to_string(),
                        reason: "Removed from artifact".to_string(),
                        killed_by: None,
                    });
                } else {
                    changes.removed.push(old.id().to_string());
                }
            }
        }
    }

    changes
}

fn option_as_slice<T>(option: &Option<T>) -> &[T] {
    option.as_ref().map_or(&[], std::slice::from_ref)
}

fn is_resolved_status(status: &str) -> bool {
    let status = status.to_lowercase();
    ["resolved", "addressed", "fixed"]
        .iter()
        .any(|term| status.contains(term))
}

fn progress(summary: &DiffSummary) -> ProgressScore {
    let kills_with_successor = summary.hypotheses_killed.min(summary.hypotheses_added);
    let points = summary.hypotheses_added
        + 2 * kills_with_successor
        + 2 * summary.tests_added
        + summary.critiques_resolved;

    match points {
        0 => ProgressScore::None,
        1..=2 => ProgressScore::Minimal,
        3..=5 => ProgressScore::Good,
        _ => ProgressScore::Excellent,
    }
}

/// Diff two snapshots of the same session
#[must_use]
pub fn diff_artifacts(before: &Artifact, after: &Artifact, options: &DiffOptions) -> ArtifactDiff {
    let b = &before.sections;
    let a = &after.sections;

    let thread = diff_items(
        option_as_slice(&b.research_thread),
        option_as_slice(&a.research_thread),
        options,
    );

    let mut hypotheses = diff_items(&b.hypothesis_slate, &a.hypothesis_slate, options);
    #[allow(clippy::cast_possible_wrap)]
    let net = hypotheses.added.len() as i64 - hypotheses.killed.len() as i64;
    hypotheses.net_change = Some(net);

    let predictions = diff_items(&b.predictions_table, &a.predictions_table, options);
    let tests = diff_items(&b.discriminative_tests, &a.discriminative_tests, options);
    let assumptions = diff_items(&b.assumption_ledger, &a.assumption_ledger, options);

    let mut anomalies = diff_items(&b.anomaly_register, &a.anomaly_register, options);
    let mut resolutions = Vec::new();
    for new in &a.anomaly_register {
        if !is_resolved_status(&new.status) || new.killed() {
            continue;
        }
        let was_resolved = ora_artifact::find_by_id(&b.anomaly_register, new.id())
            .is_some_and(|old| is_resolved_status(&old.status));
        if was_resolved {
            continue;
        }
        let mentioned = extract_hypothesis_ids(&new.resolution);
        let resolution = if let Some(target) = mentioned.into_iter().next() {
            AnomalyResolution::Promoted { target }
        } else if new.resolution.to_lowercase().contains("promoted") {
            AnomalyResolution::Promoted {
                target: "hypothesis".to_string(),
            }
        } else {
            AnomalyResolution::Dismissed
        };
        resolutions.push(AnomalyOutcome {
            id: new.id().to_string(),
            resolution,
        });
    }
    let anomalies_resolved = resolutions.len();
    anomalies.resolutions = Some(resolutions);

    let mut critiques = diff_items(&b.adversarial_critique, &a.adversarial_critique, options);
    let resolved: Vec<String> = a
        .adversarial_critique
        .iter()
        .filter(|c| !c.killed() && is_resolved_status(&c.status))
        .filter(|c| {
            ora_artifact::find_by_id(&b.adversarial_critique, c.id())
                .map_or(true, |old| !is_resolved_status(&old.status))
        })
        .map(|c| c.id.clone())
        .collect();
    let critiques_resolved = resolved.len();
    critiques.resolved = Some(resolved);

    let sections: [(&str, &SectionChanges); 7] = [
        (Section::ResearchThread.wire_name(), &thread),
        (Section::HypothesisSlate.wire_name(), &hypotheses),
        (Section::PredictionsTable.wire_name(), &predictions),
        (Section::DiscriminativeTests.wire_name(), &tests),
        (Section::AssumptionLedger.wire_name(), &assumptions),
        (Section::AnomalyRegister.wire_name(), &anomalies),
        (Section::AdversarialCritique.wire_name(), &critiques),
    ];
    let items_edited = sections.iter().map(|(_, c)| c.edited.len()).sum();

    let mut summary = DiffSummary {
        hypotheses_added: hypotheses.added.len(),
        hypotheses_killed: hypotheses.killed.len(),
        net_hypotheses: net,
        tests_added: tests.added.len(),
        critiques_resolved,
        anomalies_resolved,
        items_edited,
        progress_score: ProgressScore::None,
    };
    summary.progress_score = progress(&summary);

    let changes: IndexMap<String, SectionChanges> = sections
        .iter()
        .map(|(name, section_changes)| ((*name).to_string(), (*section_changes).clone()))
        .collect();

    ArtifactDiff {
        from_version: before.metadata.version,
        to_version: after.metadata.version,
        changes,
        summary,
    }
}

impl ArtifactDiff {
    /// Render the diff as human-readable text
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Diff v{} -> v{} (progress: {:?})",
            self.from_version, self.to_version, self.summary.progress_score
        );

        for (name, changes) in &self.changes {
            if changes.is_quiet() {
                continue;
            }
            let _ = writeln!(out, "{name}:");
            for added in &changes.added {
                let _ = writeln!(out, "  + {} {}", added.id, added.label);
                if let Some(targets) = &added.targets {
                    if !targets.is_empty() {
                        let _ = writeln!(out, "      discriminates: {}", targets.join(", "));
                    }
                }
            }
            for killed in &changes.killed {
                let _ = writeln!(out, "  - {} ({})", killed.id, killed.reason);
            }
            for edited in &changes.edited {
                let _ = writeln!(out, "  ~ {}", edited.id);
                for field in &edited.fields {
                    let _ = writeln!(
                        out,
                        "      {}: '{}' -> '{}'",
                        field.field, field.old_value, field.new_value
                    );
                }
            }
            for removed in &changes.removed {
                let _ = writeln!(out, "  x {removed} (silently removed)");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ora_artifact::{Anomaly, Critique, DiscriminativeTest, Hypothesis};

    fn hypothesis(id: &str, claim: &str) -> Hypothesis {
        Hypothesis {
            id: id.to_string(),
            name: format!("name-{id}"),
            claim: claim.to_string(),
            ..Hypothesis::default()
        }
    }

    #[test]
    fn self_diff_is_empty_with_score_none() {
        let mut artifact = Artifact::new("s1", "2026-01-01T00:00:00Z");
        artifact.sections.hypothesis_slate.push(hypothesis("H1", "claim"));

        let diff = diff_artifacts(&artifact, &artifact, &DiffOptions::default());
        for changes in diff.changes.values() {
            assert!(changes.added.is_empty());
            assert!(changes.killed.is_empty());
            assert!(changes.edited.is_empty());
        }
        assert_eq!(diff.summary.progress_score, ProgressScore::None);
    }

    #[test]
    fn added_and_killed_tracked_with_net_change() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.hypothesis_slate.push(hypothesis("H1", "old"));

        let mut after = before.clone();
        after.metadata.version = 3;
        after.sections.hypothesis_slate[0].mark_killed("agent-b", "2026-01-02T00:00:00Z", "Done");
        after.sections.hypothesis_slate.push(hypothesis("H2", "new"));

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let slate = &diff.changes["hypothesis_slate"];
        assert_eq!(slate.added.len(), 1);
        assert_eq!(slate.killed.len(), 1);
        assert_eq!(slate.killed[0].reason, "Done");
        assert_eq!(slate.killed[0].killed_by.as_deref(), Some("agent-b"));
        assert_eq!(slate.net_change, Some(0));
        assert_eq!(diff.to_version, 3);
    }

    #[test]
    fn silent_removal_is_synthetic_kill_by_default() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.hypothesis_slate.push(hypothesis("H1", "x"));
        let mut after = before.clone();
        after.sections.hypothesis_slate.clear();

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let slate = &diff.changes["hypothesis_slate"];
        assert_eq!(slate.killed.len(), 1);
        assert_eq!(slate.killed[0].reason, "Removed from artifact");

        let diff = diff_artifacts(&before, &after, &DiffOptions { implicit_kill: false });
        let slate = &diff.changes["hypothesis_slate"];
        assert!(slate.killed.is_empty());
        assert_eq!(slate.removed, vec!["H1"]);
    }

    #[test]
    fn edits_report_field_level_changes() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.hypothesis_slate.push(hypothesis("H1", "old claim"));
        let mut after = before.clone();
        after.sections.hypothesis_slate[0].claim = "new claim".to_string();

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let edited = &diff.changes["hypothesis_slate"].edited;
        assert_eq!(edited.len(), 1);
        assert_eq!(edited[0].fields.len(), 1);
        assert_eq!(edited[0].fields[0].field, "claim");
        assert_eq!(edited[0].fields[0].old_value, "old claim");
        assert_eq!(edited[0].fields[0].new_value, "new claim");
    }

    #[test]
    fn long_values_truncated() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.hypothesis_slate.push(hypothesis("H1", "short"));
        let mut after = before.clone();
        after.sections.hypothesis_slate[0].claim = "x".repeat(200);

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let change = &diff.changes["hypothesis_slate"].edited[0].fields[0];
        assert_eq!(change.new_value.chars().count(), VALUE_TRUNCATE);
        assert!(change.new_value.ends_with("..."));
    }

    #[test]
    fn test_targets_derived_from_discriminates() {
        let before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let mut after = before.clone();
        after.sections.discriminative_tests.push(DiscriminativeTest {
            id: "T1".to_string(),
            name: "probe".to_string(),
            discriminates: "H1 vs H3".to_string(),
            ..DiscriminativeTest::default()
        });

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let added = &diff.changes["discriminative_tests"].added[0];
        assert_eq!(added.targets.as_deref(), Some(&["H1".to_string(), "H3".to_string()][..]));
    }

    #[test]
    fn critique_resolution_recognized() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.adversarial_critique.push(Critique {
            id: "C1".to_string(),
            critique: "slate too narrow".to_string(),
            status: "open".to_string(),
            ..Critique::default()
        });
        let mut after = before.clone();
        after.sections.adversarial_critique[0].status = "Addressed".to_string();

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        assert_eq!(
            diff.changes["adversarial_critique"].resolved.as_deref(),
            Some(&["C1".to_string()][..])
        );
        assert_eq!(diff.summary.critiques_resolved, 1);
    }

    #[test]
    fn anomaly_promotion_classified() {
        let mut before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        before.sections.anomaly_register.push(Anomaly {
            id: "X1".to_string(),
            description: "unexpected spike".to_string(),
            status: "open".to_string(),
            ..Anomaly::default()
        });
        before.sections.anomaly_register.push(Anomaly {
            id: "X2".to_string(),
            description: "drift".to_string(),
            status: "open".to_string(),
            ..Anomaly::default()
        });

        let mut after = before.clone();
        after.sections.anomaly_register[0].status = "resolved".to_string();
        after.sections.anomaly_register[0].resolution = "promoted into H4".to_string();
        after.sections.anomaly_register[1].status = "resolved".to_string();
        after.sections.anomaly_register[1].resolution = "instrument error".to_string();

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        let outcomes = diff.changes["anomaly_register"].resolutions.as_ref().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes[0].resolution,
            AnomalyResolution::Promoted {
                target: "H4".to_string()
            }
        );
        assert_eq!(outcomes[1].resolution, AnomalyResolution::Dismissed);
    }

    #[test]
    fn progress_scales_with_substance() {
        let before = Artifact::new("s1", "2026-01-01T00:00:00Z");

        let mut minimal = before.clone();
        minimal.sections.hypothesis_slate.push(hypothesis("H1", "a"));
        let diff = diff_artifacts(&before, &minimal, &DiffOptions::default());
        assert_eq!(diff.summary.progress_score, ProgressScore::Minimal);

        let mut good = minimal.clone();
        good.sections.discriminative_tests.push(DiscriminativeTest {
            id: "T1".to_string(),
            ..DiscriminativeTest::default()
        });
        let diff = diff_artifacts(&before, &good, &DiffOptions::default());
        assert_eq!(diff.summary.progress_score, ProgressScore::Good);

        let mut excellent = good.clone();
        for i in 2..=4 {
            excellent.sections.hypothesis_slate.push(hypothesis(&format!("H{i}"), "b"));
        }
        let diff = diff_artifacts(&before, &excellent, &DiffOptions::default());
        assert_eq!(diff.summary.progress_score, ProgressScore::Excellent);
    }

    #[test]
    fn singleton_appearance_is_added() {
        let before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let mut after = before.clone();
        after.sections.research_thread = Some(ora_artifact::ResearchThread {
            id: "RT".to_string(),
            statement: "why?".to_string(),
            ..ora_artifact::ResearchThread::default()
        });

        let diff = diff_artifacts(&before, &after, &DiffOptions::default());
        assert_eq!(diff.changes["research_thread"].added.len(), 1);
        assert_eq!(diff.changes["research_thread"].added[0].label, "why?");
    }

    #[test]
    fn render_text_mentions_every_change() {
        let before = Artifact::new("s1", "2026-01-01T00:00:00Z");
        let mut after = before.clone();
        after.sections.hypothesis_slate.push(hypothesis("H1", "claim"));

        let text = diff_artifacts(&before, &after, &DiffOptions::default()).render_text();
        assert!(text.contains("hypothesis_slate"));
        assert!(text.contains("H1"));
    }
}
