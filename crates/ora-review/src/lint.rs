//! Rule-coded lint report
//!
//! The full severity-ranked view over a completed artifact. Rule families:
//!
//! - `MD` metadata well-formedness
//! - `RT` research-thread completeness
//! - `WH` hypothesis bounds
//! - `WP` prediction discrimination
//! - `WT` test completeness and score ordering
//! - `WA` assumption completeness
//! - `WC` critique completeness
//! - `PV` provenance (citation range, inference markers, potency citation)
//!
//! Findings gate promotion, not saving: a session may persist in an error
//! state; `valid` simply means zero errors.

use crate::citation::{extract_citations, is_inference_marker};
use ora_artifact::{
    active, active_count, parse_timestamp, Artifact, SectionItem, HYPOTHESIS_CAPACITY,
};
use serde::Serialize;
use std::fmt::Write as _;

/// Violation severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before promotion
    Error,

    /// Should be fixed
    Warning,

    /// Advisory
    Info,
}

impl Severity {
    /// Uppercase label for text rendering
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// One rule violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Rule id, e.g. `WT-002`
    pub id: String,

    /// Severity class
    pub severity: Severity,

    /// What is wrong
    pub message: String,

    /// Suggested fix, when one is mechanical
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

/// Violation counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LintSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// The full lint result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintReport {
    /// True iff zero errors
    pub valid: bool,

    /// Counts by severity
    pub summary: LintSummary,

    /// Violations sorted by severity, then rule id
    pub violations: Vec<Violation>,
}

impl LintReport {
    /// Render the report as human-readable text
    ///
    /// Same data as the structured report, one violation per line.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let verdict = if self.valid { "VALID" } else { "INVALID" };
        let _ = writeln!(
            out,
            "Lint: {verdict} ({} errors, {} warnings, {} info)",
            self.summary.errors, self.summary.warnings, self.summary.info
        );
        for violation in &self.violations {
            let _ = writeln!(
                out,
                "  [{}] {}: {}",
                violation.severity.label(),
                violation.id,
                violation.message
            );
            if let Some(fix) = &violation.fix {
                let _ = writeln!(out, "      fix: {fix}");
            }
        }
        out
    }
}

/// Thresholds and citation bounds for linting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Highest valid `§N` source section number
    pub source_section_max: u32,

    /// Section number of the canonical potency principle
    pub potency_citation: u32,

    /// Minimum active hypotheses
    pub min_hypotheses: usize,

    /// Minimum active predictions
    pub min_predictions: usize,

    /// Minimum active tests
    pub min_tests: usize,

    /// Minimum active assumptions
    pub min_assumptions: usize,

    /// Minimum active critiques
    pub min_critiques: usize,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            source_section_max: 40,
            potency_citation: 9,
            min_hypotheses: 3,
            min_predictions: 3,
            min_tests: 2,
            min_assumptions: 3,
            min_critiques: 2,
        }
    }
}

struct Linter<'a> {
    artifact: &'a Artifact,
    config: &'a LintConfig,
    violations: Vec<Violation>,
}

impl<'a> Linter<'a> {
    fn push(&mut self, id: &str, severity: Severity, message: impl Into<String>) {
        self.violations.push(Violation {
            id: id.to_string(),
            severity,
            message: message.into(),
            fix: None,
        });
    }

    fn push_fix(
        &mut self,
        id: &str,
        severity: Severity,
        message: impl Into<String>,
        fix: impl Into<String>,
    ) {
        self.violations.push(Violation {
            id: id.to_string(),
            severity,
            message: message.into(),
            fix: Some(fix.into()),
        });
    }

    fn metadata(&mut self) {
        let meta = &self.artifact.metadata;

        if meta.session_id.is_empty() {
            self.push("MD-001", Severity::Error, "session id is empty");
        }

        let created = parse_timestamp(&meta.created_at);
        let updated = parse_timestamp(&meta.updated_at);
        if created.is_err() {
            self.push(
                "MD-002",
                Severity::Error,
                format!("created_at is not a timestamp: '{}'", meta.created_at),
            );
        }
        if updated.is_err() {
            self.push(
                "MD-002",
                Severity::Error,
                format!("updated_at is not a timestamp: '{}'", meta.updated_at),
            );
        }
        if let (Ok(created), Ok(updated)) = (created, updated) {
            if updated < created {
                self.push(
                    "MD-003",
                    Severity::Error,
                    "updated_at is earlier than created_at",
                );
            }
        }

        if meta.contributors.is_empty() {
            self.push("MD-004", Severity::Warning, "no contributors recorded");
        }
    }

    fn research_thread(&mut self) {
        match &self.artifact.sections.research_thread {
            None => {
                self.push_fix(
                    "RT-001",
                    Severity::Error,
                    "research thread is not set",
                    "EDIT research_thread with a statement",
                );
            }
            Some(thread) => {
                if thread.statement.is_empty() {
                    self.push("RT-002", Severity::Error, "research thread statement is empty");
                }
                if thread.context.is_empty() {
                    self.push("RT-003", Severity::Warning, "research thread context is empty");
                }
                if thread.anchors.is_empty() {
                    self.push("RT-004", Severity::Warning, "research thread has no anchors");
                }
            }
        }
    }

    fn hypotheses(&mut self) {
        let slate = &self.artifact.sections.hypothesis_slate;
        let count = active_count(slate);

        if count < self.config.min_hypotheses {
            self.push_fix(
                "WH-001",
                Severity::Error,
                format!(
                    "{count} active hypotheses, need at least {}",
                    self.config.min_hypotheses
                ),
                "ADD hypotheses until the slate has three",
            );
        }
        if count > HYPOTHESIS_CAPACITY {
            self.push(
                "WH-002",
                Severity::Error,
                format!("{count} active hypotheses exceed the slate capacity of {HYPOTHESIS_CAPACITY}"),
            );
        }
        if !active(slate).any(|h| h.third_alternative) {
            self.push(
                "WH-003",
                Severity::Error,
                "no active hypothesis is flagged as the third alternative",
            );
        }
        for hypothesis in active(slate) {
            if hypothesis.claim.is_empty() {
                self.push(
                    "WH-004",
                    Severity::Warning,
                    format!("{} has no claim", hypothesis.id),
                );
            }
            if hypothesis.anchors.is_empty() {
                self.push(
                    "WH-005",
                    Severity::Warning,
                    format!("{} has no anchors", hypothesis.id),
                );
            }
        }
    }

    fn predictions(&mut self) {
        let table = &self.artifact.sections.predictions_table;
        let count = active_count(table);

        if count < self.config.min_predictions {
            self.push(
                "WP-001",
                Severity::Warning,
                format!(
                    "{count} active predictions, need at least {}",
                    self.config.min_predictions
                ),
            );
        }

        let hypothesis_ids: Vec<&str> = active(&self.artifact.sections.hypothesis_slate)
            .map(|h| h.id.as_str())
            .collect();
        if hypothesis_ids.len() < 2 {
            return;
        }

        for prediction in active(table) {
            let values: Vec<&String> = hypothesis_ids
                .iter()
                .filter_map(|id| prediction.expectations.get(*id))
                .collect();
            let mut distinct = values.clone();
            distinct.sort();
            distinct.dedup();
            if distinct.len() < 2 {
                self.push(
                    "WP-002",
                    Severity::Warning,
                    format!(
                        "{} does not discriminate: expected values are identical or missing across hypotheses",
                        prediction.id
                    ),
                );
            }
        }
    }

    fn tests(&mut self) {
        let tests = &self.artifact.sections.discriminative_tests;

        let count = active_count(tests);
        if count < self.config.min_tests {
            self.push(
                "WT-003",
                Severity::Warning,
                format!("{count} active tests, need at least {}", self.config.min_tests),
            );
        }

        for test in active(tests) {
            let mut missing = Vec::new();
            if test.procedure.is_empty() {
                missing.push("procedure");
            }
            if test.expected_outcomes.is_empty() {
                missing.push("expected_outcomes");
            }
            if test.potency_check.is_empty() {
                missing.push("potency_check");
            }
            if test.score.is_none() {
                missing.push("score");
            }
            if !missing.is_empty() {
                self.push(
                    "WT-001",
                    Severity::Warning,
                    format!("{} is incomplete: missing {}", test.id, missing.join(", ")),
                );
            }
        }

        let actives: Vec<_> = active(tests).collect();
        for pair in actives.windows(2) {
            if pair[0].total_score() < pair[1].total_score() {
                self.push_fix(
                    "WT-002",
                    Severity::Warning,
                    format!(
                        "active tests out of order: {} (score {}) precedes {} (score {})",
                        pair[0].id,
                        pair[0].total_score(),
                        pair[1].id,
                        pair[1].total_score()
                    ),
                    "re-sort discriminative_tests by descending total score",
                );
                break;
            }
        }
    }

    fn assumptions(&mut self) {
        let ledger = &self.artifact.sections.assumption_ledger;

        let count = active_count(ledger);
        if count < self.config.min_assumptions {
            self.push(
                "WA-003",
                Severity::Warning,
                format!(
                    "{count} active assumptions, need at least {}",
                    self.config.min_assumptions
                ),
            );
        }

        for assumption in active(ledger) {
            if assumption.statement.is_empty() {
                self.push(
                    "WA-001",
                    Severity::Warning,
                    format!("{} has no statement", assumption.id),
                );
            }
            if assumption.scale_check && assumption.calculation.is_empty() {
                self.push(
                    "WA-002",
                    Severity::Warning,
                    format!("{} is a scale check without a calculation", assumption.id),
                );
            }
        }
    }

    fn critiques(&mut self) {
        let critiques = &self.artifact.sections.adversarial_critique;

        let count = active_count(critiques);
        if count < self.config.min_critiques {
            self.push(
                "WC-003",
                Severity::Warning,
                format!(
                    "{count} active critiques, need at least {}",
                    self.config.min_critiques
                ),
            );
        }

        for critique in active(critiques) {
            if critique.critique.is_empty() {
                self.push(
                    "WC-001",
                    Severity::Warning,
                    format!("{} has no critique text", critique.id),
                );
            }
        }
        if !active(critiques).any(|c| c.real_third_alternative) {
            self.push(
                "WC-002",
                Severity::Warning,
                "no active critique is flagged as a real third alternative",
            );
        }
    }

    fn provenance_for<T: SectionItem>(&mut self, items: &[T]) {
        for item in items.iter().filter(|i| !i.killed()) {
            let mut cited = false;
            let mut inferred = false;

            for anchor in item.anchors() {
                let citations = extract_citations(anchor);
                for citation in &citations {
                    if citation.section == 0 || citation.section > self.config.source_section_max {
                        self.push(
                            "PV-001",
                            Severity::Error,
                            format!(
                                "{} cites §{} outside the source range 1..={}",
                                item.id(),
                                citation.section,
                                self.config.source_section_max
                            ),
                        );
                    }
                }
                cited |= !citations.is_empty();
                inferred |= is_inference_marker(anchor);
            }

            if inferred && !cited {
                self.push(
                    "PV-002",
                    Severity::Warning,
                    format!("{} is marked as inference but cites no source", item.id()),
                );
            }
        }
    }

    fn provenance(&mut self) {
        let sections = &self.artifact.sections;
        if let Some(thread) = &sections.research_thread {
            self.provenance_for(std::slice::from_ref(thread));
        }
        self.provenance_for(&sections.hypothesis_slate);
        self.provenance_for(&sections.predictions_table);
        self.provenance_for(&sections.discriminative_tests);
        self.provenance_for(&sections.assumption_ledger);
        self.provenance_for(&sections.anomaly_register);
        self.provenance_for(&sections.adversarial_critique);

        let potency = self.config.potency_citation;
        let mut advisories = Vec::new();
        for test in active(&sections.discriminative_tests) {
            if test.potency_check.is_empty() {
                continue;
            }
            if !extract_citations(&test.potency_check)
                .iter()
                .any(|c| c.section == potency)
            {
                advisories.push(test.id.clone());
            }
        }
        for id in advisories {
            self.push(
                "PV-003",
                Severity::Info,
                format!("{id} potency check does not cite the potency principle (§{potency})"),
            );
        }
    }
}

/// Lint an artifact against the full rule set
#[must_use]
pub fn lint_artifact(artifact: &Artifact, config: &LintConfig) -> LintReport {
    let mut linter = Linter {
        artifact,
        config,
        violations: Vec::new(),
    };

    linter.metadata();
    linter.research_thread();
    linter.hypotheses();
    linter.predictions();
    linter.tests();
    linter.assumptions();
    linter.critiques();
    linter.provenance();

    let mut violations = linter.violations;
    violations.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.id.cmp(&b.id)));

    let summary = LintSummary {
        errors: violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count(),
        warnings: violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count(),
        info: violations
            .iter()
            .filter(|v| v.severity == Severity::Info)
            .count(),
    };

    let report = LintReport {
        valid: summary.errors == 0,
        summary,
        violations,
    };
    tracing::debug!(
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        info = report.summary.info,
        "lint complete"
    );
    report
}
