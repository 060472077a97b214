//! Payload sanitization
//!
//! Contributors cannot forge system-owned fields or smuggle in keys that
//! alias an object's root, constructor, or prototype in dynamic host
//! languages. System fields drop silently; denylisted keys drop with a
//! warning. The `replace` control flag is extracted here and never stored.

use crate::report::{MergeWarning, WarningCode};
use indexmap::IndexMap;
use ora_artifact::SYSTEM_FIELDS;
use serde_json::Value;

/// Keys that could pollute a shared-prototype object model downstream
pub const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// A payload with system fields stripped and control flags extracted
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SanitizedPayload {
    /// Surviving contributor fields, in payload order
    pub(crate) fields: IndexMap<String, Value>,

    /// Whether list fields overwrite instead of set-union
    pub(crate) replace_lists: bool,
}

pub(crate) fn sanitize(
    payload: &IndexMap<String, Value>,
    warnings: &mut Vec<MergeWarning>,
) -> SanitizedPayload {
    let mut out = SanitizedPayload::default();

    for (key, value) in payload {
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if FORBIDDEN_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "dropping forbidden payload key");
            warnings.push(MergeWarning::new(
                WarningCode::ForbiddenKey,
                format!("dropped forbidden payload key '{key}'"),
            ));
            continue;
        }
        if key == "replace" {
            out.replace_lists = value == &Value::Bool(true);
            continue;
        }
        out.fields.insert(key.clone(), value.clone());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> IndexMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn system_fields_drop_silently() {
        let mut warnings = Vec::new();
        let out = sanitize(
            &payload(json!({"id": "H9", "killed": true, "kill_reason": "x", "claim": "c"})),
            &mut warnings,
        );
        assert_eq!(out.fields.len(), 1);
        assert!(out.fields.contains_key("claim"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn forbidden_keys_drop_with_warning() {
        let mut warnings = Vec::new();
        let out = sanitize(
            &payload(json!({"__proto__": {"polluted": true}, "constructor": 1, "name": "n"})),
            &mut warnings,
        );
        assert_eq!(out.fields.len(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| w.code == WarningCode::ForbiddenKey));
    }

    #[test]
    fn replace_flag_extracted_and_stripped() {
        let mut warnings = Vec::new();
        let out = sanitize(&payload(json!({"replace": true, "anchors": ["§3"]})), &mut warnings);
        assert!(out.replace_lists);
        assert!(!out.fields.contains_key("replace"));

        let out = sanitize(&payload(json!({"replace": false, "anchors": []})), &mut warnings);
        assert!(!out.replace_lists);
        assert!(!out.fields.contains_key("replace"));
    }

    #[test]
    fn payload_order_preserved() {
        let mut warnings = Vec::new();
        let out = sanitize(&payload(json!({"b": 1, "a": 2, "c": 3})), &mut warnings);
        let keys: Vec<_> = out.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
