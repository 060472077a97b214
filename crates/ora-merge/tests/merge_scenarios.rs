//! End-to-end merge scenarios

use ora_artifact::Section;
use ora_merge::{merge, merge_attributed, AttributedDelta, MergeError, WarningCode};
use ora_test_utils::{add_delta, base_artifact, edit_delta, kill_delta};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn first_hypothesis_gets_h1_and_version_1() {
    let base = base_artifact();
    let delta = add_delta(
        Section::HypothesisSlate,
        json!({"name": "H1", "claim": "X", "mechanism": "Y"}),
    );

    let outcome = merge(&base, &[delta], "agent-1", "2026-01-02T00:00:00Z");
    assert!(outcome.success);

    let artifact = outcome.adoptable().expect("adoptable");
    assert_eq!(artifact.metadata.version, 1);

    let h = &artifact.sections.hypothesis_slate[0];
    assert_eq!(h.id, "H1");
    assert_eq!(h.claim, "X");
    assert!(!h.killed);
}

#[test]
fn edit_on_killed_target_warns_but_succeeds() {
    let base = base_artifact();
    let outcome = merge(
        &base,
        &[add_delta(Section::HypothesisSlate, json!({"claim": "original"}))],
        "agent-1",
        "2026-01-02T00:00:00Z",
    );
    let outcome = merge(
        outcome.adoptable().expect("adoptable"),
        &[kill_delta(Section::HypothesisSlate, "H1", "Done")],
        "Agent2",
        "2026-01-03T00:00:00Z",
    );
    let with_kill = outcome.adoptable().expect("adoptable").clone();

    let outcome = merge(
        &with_kill,
        &[edit_delta(Section::HypothesisSlate, "H1", json!({"claim": "revised"}))],
        "agent-3",
        "2026-01-04T00:00:00Z",
    );

    assert!(outcome.success);
    assert_eq!(outcome.report.skipped_count, 1);
    let killed_warnings: Vec<_> = outcome
        .report
        .warnings
        .iter()
        .filter(|w| w.code == WarningCode::TargetKilled)
        .collect();
    assert_eq!(killed_warnings.len(), 1);

    let h = &outcome.artifact.sections.hypothesis_slate[0];
    assert_eq!(h.claim, "original");
    assert_eq!(h.killed_by.as_deref(), Some("Agent2"));
    assert_eq!(h.kill_reason.as_deref(), Some("Done"));
}

#[test]
fn seventh_hypothesis_fails_leaving_six() {
    let base = base_artifact();
    let deltas: Vec<_> = (0..7)
        .map(|i| add_delta(Section::HypothesisSlate, json!({"name": format!("h{i}")})))
        .collect();

    let outcome = merge(&base, &deltas, "agent-1", "2026-01-02T00:00:00Z");

    assert!(!outcome.success);
    assert_eq!(outcome.report.applied_count, 6);
    assert_eq!(outcome.report.failed_count, 1);
    assert!(matches!(
        outcome.report.errors().next(),
        Some(MergeError::SectionAtCapacity { capacity: 6, .. })
    ));
    assert_eq!(outcome.artifact.sections.hypothesis_slate.len(), 6);
    assert!(outcome.adoptable().is_none());
}

#[test]
fn anchors_union_then_replace() {
    let base = base_artifact();
    let outcome = merge(
        &base,
        &[add_delta(
            Section::HypothesisSlate,
            json!({"name": "n", "anchors": ["§1", "§2"]}),
        )],
        "agent-1",
        "2026-01-02T00:00:00Z",
    );
    let with_anchors = outcome.adoptable().expect("adoptable").clone();

    let outcome = merge(
        &with_anchors,
        &[edit_delta(Section::HypothesisSlate, "H1", json!({"anchors": ["§3"]}))],
        "agent-1",
        "2026-01-03T00:00:00Z",
    );
    let unioned = outcome.adoptable().expect("adoptable").clone();
    assert_eq!(
        unioned.sections.hypothesis_slate[0].anchors,
        vec!["§1", "§2", "§3"]
    );

    let outcome = merge(
        &with_anchors,
        &[edit_delta(
            Section::HypothesisSlate,
            "H1",
            json!({"anchors": ["§3"], "replace": true}),
        )],
        "agent-1",
        "2026-01-03T00:00:00Z",
    );
    assert_eq!(
        outcome.adoptable().expect("adoptable").sections.hypothesis_slate[0].anchors,
        vec!["§3"]
    );
}

#[test]
fn kill_beats_later_edit_in_same_merge() {
    let base = base_artifact();
    let outcome = merge(
        &base,
        &[add_delta(Section::HypothesisSlate, json!({"claim": "stands"}))],
        "agent-1",
        "2026-01-02T00:00:00Z",
    );
    let with_h1 = outcome.adoptable().expect("adoptable").clone();

    let deltas = vec![
        AttributedDelta::new(
            edit_delta(Section::HypothesisSlate, "H1", json!({"claim": "late edit"})),
            "agent-b",
            "2026-01-05T00:00:00Z",
        ),
        AttributedDelta::new(
            kill_delta(Section::HypothesisSlate, "H1", "retired"),
            "agent-a",
            "2026-01-04T00:00:00Z",
        ),
    ];
    let outcome = merge_attributed(&with_h1, deltas);

    assert!(outcome.success);
    let h = &outcome.artifact.sections.hypothesis_slate[0];
    assert!(h.killed);
    assert_eq!(h.claim, "stands");
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::TargetKilled));
}

#[test]
fn multi_actor_merge_records_both_contributors() {
    let base = base_artifact();
    let deltas = vec![
        AttributedDelta::new(
            add_delta(Section::AssumptionLedger, json!({"statement": "a"})),
            "agent-a",
            "2026-01-02T00:00:00Z",
        ),
        AttributedDelta::new(
            add_delta(Section::AnomalyRegister, json!({"description": "odd"})),
            "agent-b",
            "2026-01-03T00:00:00Z",
        ),
    ];

    let outcome = merge_attributed(&base, deltas);
    let contributors = &outcome.artifact.metadata.contributors;
    assert_eq!(contributors.len(), 2);
    assert_eq!(outcome.artifact.metadata.updated_at, "2026-01-03T00:00:00Z");
}

#[test]
fn singleton_lifecycle_via_merge() {
    let base = base_artifact();
    let outcome = merge(
        &base,
        &[edit_delta(
            Section::ResearchThread,
            "RT",
            json!({"statement": "what sets the tide's pitch?", "anchors": ["§1"]}),
        )],
        "agent-1",
        "2026-01-02T00:00:00Z",
    );

    let thread = outcome
        .adoptable()
        .expect("adoptable")
        .sections
        .research_thread
        .as_ref()
        .expect("thread");
    assert_eq!(thread.id, "RT");
    assert_eq!(thread.statement, "what sets the tide's pitch?");
    assert_eq!(thread.context, "");
    assert_eq!(thread.current_focus, "");
}
