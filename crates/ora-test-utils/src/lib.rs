//! Testing utilities for the ORA workspace
//!
//! Shared fixtures: canned artifacts and delta constructors.

#![allow(missing_docs)]

use indexmap::IndexMap;
use ora_artifact::{Artifact, Assumption, Critique, DiscriminativeTest, Hypothesis, Section, TestScore};
use ora_delta::{Delta, DeltaOp};
use serde_json::Value;

pub const T0: &str = "2026-01-01T00:00:00Z";

pub fn payload_from(value: Value) -> IndexMap<String, Value> {
    match serde_json::from_value(value) {
        Ok(map) => map,
        Err(_) => IndexMap::new(),
    }
}

pub fn base_artifact() -> Artifact {
    Artifact::new("session-test", T0)
}

pub fn add_delta(section: Section, payload: Value) -> Delta {
    Delta {
        operation: DeltaOp::Add,
        section,
        target_id: None,
        payload: payload_from(payload),
        rationale: String::new(),
    }
}

pub fn edit_delta(section: Section, target: &str, payload: Value) -> Delta {
    Delta {
        operation: DeltaOp::Edit,
        section,
        target_id: Some(target.to_string()),
        payload: payload_from(payload),
        rationale: String::new(),
    }
}

pub fn kill_delta(section: Section, target: &str, reason: &str) -> Delta {
    Delta {
        operation: DeltaOp::Kill,
        section,
        target_id: Some(target.to_string()),
        payload: payload_from(serde_json::json!({ "reason": reason })),
        rationale: String::new(),
    }
}

pub fn hypothesis_fixture(id: &str) -> Hypothesis {
    Hypothesis {
        id: id.to_string(),
        name: format!("hypothesis {id}"),
        claim: format!("claim for {id}"),
        mechanism: "some mechanism".to_string(),
        anchors: vec!["§2".to_string()],
        ..Hypothesis::default()
    }
}

pub fn scored_test_fixture(id: &str, discrimination: u8) -> DiscriminativeTest {
    DiscriminativeTest {
        id: id.to_string(),
        name: format!("test {id}"),
        procedure: "measure and compare".to_string(),
        expected_outcomes: "outcomes differ by hypothesis".to_string(),
        potency_check: "a decisive outcome decides (§9)".to_string(),
        score: Some(TestScore {
            discrimination,
            ..TestScore::default()
        }),
        ..DiscriminativeTest::default()
    }
}

pub fn scale_check_fixture(id: &str) -> Assumption {
    Assumption {
        id: id.to_string(),
        statement: "the effect is within measurable range".to_string(),
        scale_check: true,
        calculation: "10^3 events/day x 30 days >> detection floor".to_string(),
        ..Assumption::default()
    }
}

pub fn critique_fixture(id: &str) -> Critique {
    Critique {
        id: id.to_string(),
        critique: "both hypotheses assume the same driver".to_string(),
        target: "hypothesis_slate".to_string(),
        status: "open".to_string(),
        real_third_alternative: true,
        ..Critique::default()
    }
}
