//! Per-delta application rules
//!
//! One delta at a time against the working document:
//!
//! 1. ADD mints a sequential id and appends (capacity permitting)
//! 2. EDIT merges sanitized fields over the target; string-list fields
//!    set-union unless the payload carried `replace: true`
//! 3. KILL sets the kill record once; killed is a terminal state checked
//!    at apply time, not a timestamp race
//!
//! The discriminative-test collection is re-sorted by descending total
//! score after any ADD or score-changing EDIT (stable, so ties keep their
//! prior relative order).

use crate::report::{MergeError, MergeWarning, WarningCode};
use crate::sanitize::{sanitize, SanitizedPayload};
use ora_artifact::{
    active, active_count, Artifact, DiscriminativeTest, ResearchThread, Section, SectionItem,
    SINGLETON_ID,
};
use ora_delta::{Delta, DeltaOp};
use serde_json::Value;

/// What a single delta did to the working document
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    /// Landed; `id` names the item created, edited, or killed
    Applied { section: Section, id: String },

    /// Legal but deliberately not applied
    Skipped {
        section: Section,
        id: String,
        note: String,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum EditOutcome {
    Edited,
    TargetKilled,
}

#[derive(Debug, PartialEq, Eq)]
enum KillOutcome {
    Killed,
    AlreadyKilled,
}

fn as_string_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Some(items),
        _ => None,
    }
}

fn union_string_lists(current: &[Value], incoming: &[Value]) -> Value {
    let mut merged: Vec<Value> = current.to_vec();
    for item in incoming {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    Value::Array(merged)
}

/// Merge sanitized payload fields over an item's current fields
fn merge_fields<T: SectionItem>(current: &T, payload: &SanitizedPayload) -> Result<T, MergeError> {
    let mut map = current.as_field_map();

    for (key, incoming) in &payload.fields {
        let merged = match (map.get(key).and_then(as_string_array), as_string_array(incoming)) {
            (Some(cur), Some(inc)) if !payload.replace_lists => union_string_lists(cur, inc),
            _ => incoming.clone(),
        };
        map.insert(key.clone(), merged);
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| MergeError::PayloadShape {
        section: T::SECTION,
        detail: e.to_string(),
    })
}

fn add_item<T: SectionItem>(
    items: &mut Vec<T>,
    payload: &SanitizedPayload,
) -> Result<String, MergeError> {
    let section = T::SECTION;

    if let Some(capacity) = section.capacity() {
        if active_count(items) >= capacity {
            return Err(MergeError::SectionAtCapacity { section, capacity });
        }
    }

    let mut map = serde_json::Map::new();
    for (key, value) in &payload.fields {
        map.insert(key.clone(), value.clone());
    }
    let mut item: T =
        serde_json::from_value(Value::Object(map)).map_err(|e| MergeError::PayloadShape {
            section,
            detail: e.to_string(),
        })?;

    let id = ora_artifact::next_id(items);
    item.set_id(id.clone());
    items.push(item);
    Ok(id)
}

fn edit_item<T: SectionItem>(
    items: &mut [T],
    target: &str,
    payload: &SanitizedPayload,
) -> Result<EditOutcome, MergeError> {
    let pos = items
        .iter()
        .position(|item| item.id() == target)
        .ok_or_else(|| MergeError::TargetNotFound {
            section: T::SECTION,
            target: target.to_string(),
        })?;

    if items[pos].killed() {
        return Ok(EditOutcome::TargetKilled);
    }

    items[pos] = merge_fields(&items[pos], payload)?;
    Ok(EditOutcome::Edited)
}

fn kill_item<T: SectionItem>(
    items: &mut [T],
    target: &str,
    by: &str,
    at: &str,
    reason: &str,
) -> Result<KillOutcome, MergeError> {
    let item = items
        .iter_mut()
        .find(|item| item.id() == target)
        .ok_or_else(|| MergeError::TargetNotFound {
            section: T::SECTION,
            target: target.to_string(),
        })?;

    if item.killed() {
        return Ok(KillOutcome::AlreadyKilled);
    }

    item.mark_killed(by, at, reason);
    Ok(KillOutcome::Killed)
}

fn edit_singleton(
    slot: &mut Option<ResearchThread>,
    payload: &SanitizedPayload,
) -> Result<String, MergeError> {
    let base = match slot.as_ref() {
        Some(thread) => thread.clone(),
        None => ResearchThread {
            id: SINGLETON_ID.to_string(),
            ..ResearchThread::default()
        },
    };
    *slot = Some(merge_fields(&base, payload)?);
    Ok(SINGLETON_ID.to_string())
}

fn sort_tests(tests: &mut [DiscriminativeTest]) {
    tests.sort_by(|a, b| b.total_score().cmp(&a.total_score()));
}

fn require_target<'a>(delta: &'a Delta) -> Result<&'a str, MergeError> {
    delta
        .target_id
        .as_deref()
        .ok_or(MergeError::MissingTarget {
            operation: delta.operation,
            section: delta.section,
        })
}

/// Apply one delta to the working document
///
/// # Errors
/// Hard apply-time errors ([`MergeError`]) make the merge outcome
/// non-adoptable; advisory findings land in `warnings` instead.
pub(crate) fn apply_delta(
    artifact: &mut Artifact,
    delta: &Delta,
    agent: &str,
    timestamp: &str,
    warnings: &mut Vec<MergeWarning>,
) -> Result<ApplyOutcome, MergeError> {
    let section = delta.section;
    let sections = &mut artifact.sections;

    match delta.operation {
        DeltaOp::Add => {
            let payload = sanitize(&delta.payload, warnings);
            let id = match section {
                Section::ResearchThread => {
                    return Err(MergeError::SingletonOperation {
                        operation: delta.operation,
                        section,
                    })
                }
                Section::HypothesisSlate => add_item(&mut sections.hypothesis_slate, &payload)?,
                Section::PredictionsTable => add_item(&mut sections.predictions_table, &payload)?,
                Section::DiscriminativeTests => {
                    let id = add_item(&mut sections.discriminative_tests, &payload)?;
                    sort_tests(&mut sections.discriminative_tests);
                    id
                }
                Section::AssumptionLedger => add_item(&mut sections.assumption_ledger, &payload)?,
                Section::AnomalyRegister => add_item(&mut sections.anomaly_register, &payload)?,
                Section::AdversarialCritique => {
                    add_item(&mut sections.adversarial_critique, &payload)?
                }
            };
            Ok(ApplyOutcome::Applied { section, id })
        }

        DeltaOp::Edit => {
            let payload = sanitize(&delta.payload, warnings);

            if section.is_singleton() {
                let id = edit_singleton(&mut sections.research_thread, &payload)?;
                return Ok(ApplyOutcome::Applied { section, id });
            }

            let target = require_target(delta)?;
            let outcome = match section {
                Section::ResearchThread => unreachable!("singleton handled above"),
                Section::HypothesisSlate => {
                    edit_item(&mut sections.hypothesis_slate, target, &payload)?
                }
                Section::PredictionsTable => {
                    edit_item(&mut sections.predictions_table, target, &payload)?
                }
                Section::DiscriminativeTests => {
                    let outcome =
                        edit_item(&mut sections.discriminative_tests, target, &payload)?;
                    if outcome == EditOutcome::Edited && payload.fields.contains_key("score") {
                        sort_tests(&mut sections.discriminative_tests);
                    }
                    outcome
                }
                Section::AssumptionLedger => {
                    edit_item(&mut sections.assumption_ledger, target, &payload)?
                }
                Section::AnomalyRegister => {
                    edit_item(&mut sections.anomaly_register, target, &payload)?
                }
                Section::AdversarialCritique => {
                    edit_item(&mut sections.adversarial_critique, target, &payload)?
                }
            };

            match outcome {
                EditOutcome::Edited => Ok(ApplyOutcome::Applied {
                    section,
                    id: target.to_string(),
                }),
                EditOutcome::TargetKilled => {
                    warnings.push(MergeWarning::new(
                        WarningCode::TargetKilled,
                        format!("EDIT skipped: {target} in {section} is killed"),
                    ));
                    Ok(ApplyOutcome::Skipped {
                        section,
                        id: target.to_string(),
                        note: "target is killed".to_string(),
                    })
                }
            }
        }

        DeltaOp::Kill => {
            if section.is_singleton() {
                return Err(MergeError::SingletonOperation {
                    operation: delta.operation,
                    section,
                });
            }

            let target = require_target(delta)?;
            let reason = delta
                .payload
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("");

            let outcome = match section {
                Section::ResearchThread => unreachable!("singleton handled above"),
                Section::HypothesisSlate => {
                    kill_item(&mut sections.hypothesis_slate, target, agent, timestamp, reason)?
                }
                Section::PredictionsTable => kill_item(
                    &mut sections.predictions_table,
                    target,
                    agent,
                    timestamp,
                    reason,
                )?,
                Section::DiscriminativeTests => kill_item(
                    &mut sections.discriminative_tests,
                    target,
                    agent,
                    timestamp,
                    reason,
                )?,
                Section::AssumptionLedger => kill_item(
                    &mut sections.assumption_ledger,
                    target,
                    agent,
                    timestamp,
                    reason,
                )?,
                Section::AnomalyRegister => kill_item(
                    &mut sections.anomaly_register,
                    target,
                    agent,
                    timestamp,
                    reason,
                )?,
                Section::AdversarialCritique => kill_item(
                    &mut sections.adversarial_critique,
                    target,
                    agent,
                    timestamp,
                    reason,
                )?,
            };

            match outcome {
                KillOutcome::Killed => {
                    if section == Section::HypothesisSlate
                        && !active(&sections.hypothesis_slate).any(|h| h.third_alternative)
                    {
                        warnings.push(MergeWarning::new(
                            WarningCode::NoThirdAlternative,
                            "no remaining active hypothesis is flagged as the third alternative",
                        ));
                    }
                    if section == Section::AssumptionLedger
                        && !active(&sections.assumption_ledger).any(|a| a.scale_check)
                    {
                        warnings.push(MergeWarning::new(
                            WarningCode::NoScaleCheck,
                            "no remaining active assumption is flagged as a scale check",
                        ));
                    }
                    Ok(ApplyOutcome::Applied {
                        section,
                        id: target.to_string(),
                    })
                }
                KillOutcome::AlreadyKilled => Ok(ApplyOutcome::Skipped {
                    section,
                    id: target.to_string(),
                    note: "target already killed".to_string(),
                }),
            }
        }
    }
}
