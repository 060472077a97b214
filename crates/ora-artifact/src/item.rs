//! Section item variants
//!
//! One typed struct per section, sharing the base item contract through
//! [`SectionItem`]: a section-prefixed id plus soft-delete kill metadata.
//! Unknown contributor fields survive round-trips in each item's `extra`
//! flatten map, so the model is lossless against payloads it does not
//! recognize (cross-session `references` included).

use crate::section::Section;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields owned by the system, never writable through payloads
pub const SYSTEM_FIELDS: [&str; 5] = ["id", "killed", "killed_by", "killed_at", "kill_reason"];

fn is_false(value: &bool) -> bool {
    !*value
}

/// Common lifecycle surface of every section item
///
/// # Invariants
/// - `id` carries the section's fixed prefix and is never reused
/// - kill metadata, once set, is permanent
pub trait SectionItem: Clone + Serialize + DeserializeOwned {
    /// Section this item type belongs to
    const SECTION: Section;

    /// Item id (`H3`, `T1`, ...)
    fn id(&self) -> &str;

    /// Overwrite the id (used only when minting)
    fn set_id(&mut self, id: String);

    /// Whether this item has been soft-deleted
    fn killed(&self) -> bool;

    /// Kill metadata accessors
    fn killed_by(&self) -> Option<&str>;
    /// Timestamp the item was killed at
    fn killed_at(&self) -> Option<&str>;
    /// Reason given for the kill
    fn kill_reason(&self) -> Option<&str>;

    /// Mark the item killed
    ///
    /// No-op if the item is already killed; the original record wins.
    fn mark_killed(&mut self, by: &str, at: &str, reason: &str);

    /// Citation anchors carried by this item
    fn anchors(&self) -> &[String];

    /// Contributor fields outside the typed schema
    fn extra(&self) -> &IndexMap<String, Value>;

    /// Project the item to a JSON field map
    ///
    /// Used by the merge engine and differ for field-level work. Items
    /// always serialize to objects; a non-object projection yields an
    /// empty map.
    fn as_field_map(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

macro_rules! impl_section_item {
    ($ty:ty, $section:expr) => {
        impl SectionItem for $ty {
            const SECTION: Section = $section;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn killed(&self) -> bool {
                self.killed
            }

            fn killed_by(&self) -> Option<&str> {
                self.killed_by.as_deref()
            }

            fn killed_at(&self) -> Option<&str> {
                self.killed_at.as_deref()
            }

            fn kill_reason(&self) -> Option<&str> {
                self.kill_reason.as_deref()
            }

            fn mark_killed(&mut self, by: &str, at: &str, reason: &str) {
                if self.killed {
                    return;
                }
                self.killed = true;
                self.killed_by = Some(by.to_string());
                self.killed_at = Some(at.to_string());
                self.kill_reason = Some(reason.to_string());
            }

            fn anchors(&self) -> &[String] {
                &self.anchors
            }

            fn extra(&self) -> &IndexMap<String, Value> {
                &self.extra
            }
        }
    };
}

/// The research question under investigation (singleton, id `RT`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchThread {
    /// Fixed singleton id
    #[serde(default)]
    pub id: String,

    /// The question being pursued
    #[serde(default)]
    pub statement: String,

    /// Background and framing
    #[serde(default)]
    pub context: String,

    /// Where attention currently is
    #[serde(default)]
    pub current_focus: String,

    /// Source citations (`§N` / `§N-M`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    /// Contributor fields outside the typed schema
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(ResearchThread, Section::ResearchThread);

/// A competing hypothesis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    #[serde(default)]
    pub id: String,

    /// Short handle
    #[serde(default)]
    pub name: String,

    /// What the hypothesis asserts
    #[serde(default)]
    pub claim: String,

    /// Causal story behind the claim
    #[serde(default)]
    pub mechanism: String,

    /// Marks the deliberately-unconventional alternative
    #[serde(default, skip_serializing_if = "is_false")]
    pub third_alternative: bool,

    /// Ids of hypotheses this one is incompatible with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(Hypothesis, Section::HypothesisSlate);

/// A prediction row: one observable, expected value per hypothesis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,

    /// What would be observed
    #[serde(default)]
    pub observable: String,

    /// Hypothesis id → expected observation
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub expectations: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(Prediction, Section::PredictionsTable);

/// Four-axis 0–3 score for a discriminative test
///
/// Missing sub-scores deserialize to 0 and count as 0 in the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScore {
    /// How cleanly outcomes separate hypotheses
    #[serde(default)]
    pub discrimination: u8,

    /// How practical the test is to run
    #[serde(default)]
    pub feasibility: u8,

    /// Inverse resource cost
    #[serde(default)]
    pub cost: u8,

    /// Inverse time to a result
    #[serde(default)]
    pub speed: u8,
}

impl TestScore {
    /// Sum of the four sub-scores
    #[inline]
    #[must_use]
    pub fn total(&self) -> u32 {
        u32::from(self.discrimination)
            + u32::from(self.feasibility)
            + u32::from(self.cost)
            + u32::from(self.speed)
    }
}

/// A test scored for its power to separate hypotheses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscriminativeTest {
    #[serde(default)]
    pub id: String,

    /// Short handle
    #[serde(default)]
    pub name: String,

    /// How to run the test
    #[serde(default)]
    pub procedure: String,

    /// Outcome expected under each hypothesis it discriminates
    #[serde(default)]
    pub expected_outcomes: String,

    /// Why a decisive outcome would actually decide
    #[serde(default)]
    pub potency_check: String,

    /// Hypothesis ids this test separates (free-form, id-bearing)
    #[serde(default)]
    pub discriminates: String,

    /// Four-axis score; absent means unscored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<TestScore>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl DiscriminativeTest {
    /// Total score, 0 when unscored
    #[inline]
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.score.map_or(0, |s| s.total())
    }
}

impl_section_item!(DiscriminativeTest, Section::DiscriminativeTests);

/// An explicit assumption the slate rests on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    #[serde(default)]
    pub id: String,

    /// The assumed fact
    #[serde(default)]
    pub statement: String,

    /// Marks an order-of-magnitude sanity check
    #[serde(default, skip_serializing_if = "is_false")]
    pub scale_check: bool,

    /// The back-of-envelope calculation for a scale check
    #[serde(default)]
    pub calculation: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(Assumption, Section::AssumptionLedger);

/// An observation no current hypothesis accounts for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(default)]
    pub id: String,

    /// What was observed
    #[serde(default)]
    pub description: String,

    /// Free-form status; `resolved` is recognized by the differ
    #[serde(default)]
    pub status: String,

    /// Resolution plan or outcome
    #[serde(default)]
    pub resolution: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(Anomaly, Section::AnomalyRegister);

/// An adversarial critique of the current slate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    #[serde(default)]
    pub id: String,

    /// The critique itself
    #[serde(default)]
    pub critique: String,

    /// Item or aspect under attack
    #[serde(default)]
    pub target: String,

    /// Free-form status; resolved/addressed/fixed are recognized
    #[serde(default)]
    pub status: String,

    /// Marks a critique that is itself a real third alternative
    #[serde(default, skip_serializing_if = "is_false")]
    pub real_third_alternative: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_reason: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl_section_item!(Critique, Section::AdversarialCritique);

/// Find an item by id
#[must_use]
pub fn find_by_id<'a, T: SectionItem>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// Find an item by id, mutably
#[must_use]
pub fn find_by_id_mut<'a, T: SectionItem>(items: &'a mut [T], id: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Iterate over active (non-killed) items
pub fn active<T: SectionItem>(items: &[T]) -> impl Iterator<Item = &T> {
    items.iter().filter(|item| !item.killed())
}

/// Count of active (non-killed) items
#[must_use]
pub fn active_count<T: SectionItem>(items: &[T]) -> usize {
    active(items).count()
}

/// Mint the next sequential id for a collection
///
/// Killed items still occupy their suffix; ids are never reused.
#[must_use]
pub fn next_id<T: SectionItem>(items: &[T]) -> String {
    let section = T::SECTION;
    let max = items
        .iter()
        .filter_map(|item| section.id_suffix(item.id()))
        .max()
        .unwrap_or(0);
    section.make_id(max + 1)
}
