//! Property tests for the merge engine's determinism guarantees

use ora_artifact::{Section, SectionItem};
use ora_delta::Delta;
use ora_merge::{merge, merge_attributed, AttributedDelta};
use ora_test_utils::{add_delta, base_artifact, edit_delta, kill_delta};
use proptest::prelude::*;
use serde_json::json;

fn stamp(i: usize) -> String {
    format!("2026-01-02T00:{:02}:{:02}Z", i / 60, i % 60)
}

/// A fixed pool of deltas covering all three operations
fn delta_pool() -> Vec<Delta> {
    vec![
        add_delta(Section::HypothesisSlate, json!({"name": "a", "claim": "ca"})),
        add_delta(Section::HypothesisSlate, json!({"name": "b", "claim": "cb"})),
        add_delta(Section::AssumptionLedger, json!({"statement": "s1"})),
        add_delta(
            Section::DiscriminativeTests,
            json!({"name": "t1", "score": {"discrimination": 2}}),
        ),
        add_delta(
            Section::DiscriminativeTests,
            json!({"name": "t2", "score": {"discrimination": 3}}),
        ),
        edit_delta(Section::ResearchThread, "RT", json!({"statement": "why"})),
        add_delta(Section::AnomalyRegister, json!({"description": "blip"})),
        add_delta(Section::AdversarialCritique, json!({"critique": "narrow"})),
    ]
}

proptest! {
    #[test]
    fn merge_is_order_independent(perm in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle()) {
        let base = base_artifact();
        let pool = delta_pool();

        // Identity order, timestamps fixed per pool position.
        let in_order: Vec<AttributedDelta> = pool
            .iter()
            .enumerate()
            .map(|(i, d)| AttributedDelta::new(d.clone(), "agent", stamp(i)))
            .collect();

        // Same multiset, permuted arrival order, same per-delta timestamps.
        let permuted: Vec<AttributedDelta> = perm
            .iter()
            .map(|&i| AttributedDelta::new(pool[i].clone(), "agent", stamp(i)))
            .collect();

        let a = merge_attributed(&base, in_order);
        let b = merge_attributed(&base, permuted);

        prop_assert!(a.success && b.success);
        let a_json = serde_json::to_string(&a.artifact).expect("serialize");
        let b_json = serde_json::to_string(&b.artifact).expect("serialize");
        prop_assert_eq!(a_json, b_json);
    }

    #[test]
    fn kill_is_idempotent(repeats in 1usize..5) {
        let base = base_artifact();
        let outcome = merge(
            &base,
            &[add_delta(Section::HypothesisSlate, json!({"claim": "x"}))],
            "agent-1",
            "2026-01-02T00:00:00Z",
        );
        let mut current = outcome.adoptable().expect("adoptable").clone();

        let first = merge(
            &current,
            &[kill_delta(Section::HypothesisSlate, "H1", "first reason")],
            "agent-1",
            "2026-01-03T00:00:00Z",
        );
        current = first.adoptable().expect("adoptable").clone();

        for round in 0..repeats {
            let outcome = merge(
                &current,
                &[kill_delta(Section::HypothesisSlate, "H1", "other reason")],
                "agent-2",
                &format!("2026-01-04T00:00:{round:02}Z"),
            );
            prop_assert!(outcome.success);
            current = outcome.artifact;

            let h = &current.sections.hypothesis_slate[0];
            prop_assert_eq!(h.kill_reason.as_deref(), Some("first reason"));
            prop_assert_eq!(h.killed_by.as_deref(), Some("agent-1"));
            prop_assert_eq!(h.killed_at.as_deref(), Some("2026-01-03T00:00:00Z"));
        }
    }

    #[test]
    fn ids_are_strictly_increasing(kill_mask in prop::collection::vec(any::<bool>(), 5)) {
        let base = base_artifact();
        let mut current = base;
        let mut seen = Vec::new();

        for (i, kill_previous) in kill_mask.iter().enumerate() {
            let outcome = merge(
                &current,
                &[add_delta(Section::AssumptionLedger, json!({"statement": format!("s{i}")}))],
                "agent",
                &stamp(i * 2),
            );
            current = outcome.adoptable().expect("adoptable").clone();
            let last_id = current
                .sections
                .assumption_ledger
                .last()
                .expect("added")
                .id()
                .to_string();
            seen.push(last_id.clone());

            if *kill_previous {
                let outcome = merge(
                    &current,
                    &[kill_delta(Section::AssumptionLedger, &last_id, "churn")],
                    "agent",
                    &stamp(i * 2 + 1),
                );
                current = outcome.adoptable().expect("adoptable").clone();
            }
        }

        let suffixes: Vec<u64> = seen
            .iter()
            .map(|id| Section::AssumptionLedger.id_suffix(id).expect("prefixed id"))
            .collect();
        for pair in suffixes.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}
