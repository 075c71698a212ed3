//! Unmapped-field metadata sidecar.
//!
//! Source fields with no declared mapping are not discarded: they are
//! diverted, verbatim, into a metadata side-channel so the original record can
//! be reconstructed on a reverse pass. Diversion is a strict partition of the
//! source record's top-level fields into mapped, dropped, and unmapped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// A preserved unmapped source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedEntry {
    /// The raw source value, untouched.
    pub value: Value,
    /// Optional static annotation (e.g. which platform the field came from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Unmapped metadata keyed by top-level source field name.
///
/// A `BTreeMap` keeps iteration (and serialization) order stable regardless of
/// the key order of the incoming record, so repeated runs over identical input
/// are byte-identical.
pub type UnmappedMetadata = BTreeMap<String, UnmappedEntry>;

/// Capture every top-level source field that is neither consumed by a mapping
/// nor configured as dropped.
///
/// `consumed_roots` holds the root segments of all source paths a transformer
/// actually read; `dropped` holds field names configured to be discarded.
#[must_use]
pub fn divert(
    source: &Map<String, Value>,
    consumed_roots: &HashSet<&str>,
    dropped: &HashSet<String>,
    annotation: Option<&str>,
) -> UnmappedMetadata {
    let mut out = UnmappedMetadata::new();
    for (field, value) in source {
        if consumed_roots.contains(field.as_str()) || dropped.contains(field) {
            continue;
        }
        out.insert(
            field.clone(),
            UnmappedEntry {
                value: value.clone(),
                description: annotation.map(str::to_string),
            },
        );
    }
    out
}

/// Restore the preserved fields as partial source-record fields.
///
/// Descriptions are metadata about the capture, not data; they are ignored.
#[must_use]
pub fn reinject(metadata: &UnmappedMetadata) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(field, entry)| (field.clone(), entry.value.clone()))
        .collect()
}

/// Merge `newer` into `existing`: newer values win, but an existing
/// description is kept when the newer entry has none.
#[must_use]
pub fn merge(existing: &UnmappedMetadata, newer: &UnmappedMetadata) -> UnmappedMetadata {
    let mut out = existing.clone();
    for (field, entry) in newer {
        match out.get_mut(field) {
            Some(current) => {
                current.value = entry.value.clone();
                if entry.description.is_some() {
                    current.description.clone_from(&entry.description);
                }
            }
            None => {
                out.insert(field.clone(), entry.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("test source is an object")
    }

    #[test]
    fn divert_captures_only_unconsumed_fields() {
        let src = source(json!({
            "email": "a@b.com",
            "first_name": "Jo",
            "dialpad_license_type": "premium"
        }));
        let consumed: HashSet<&str> = ["email", "first_name"].into();
        let out = divert(&src, &consumed, &HashSet::new(), None);

        assert_eq!(out.len(), 1);
        assert_eq!(out["dialpad_license_type"].value, json!("premium"));
        assert_eq!(out["dialpad_license_type"].description, None);
    }

    #[test]
    fn divert_skips_dropped_fields() {
        let src = source(json!({ "email": "a@b.com", "internal_flag": true }));
        let dropped: HashSet<String> = ["internal_flag".to_string()].into();
        let consumed: HashSet<&str> = ["email"].into();
        let out = divert(&src, &consumed, &dropped, None);
        assert!(out.is_empty());
    }

    #[test]
    fn divert_annotates_when_asked() {
        let src = source(json!({ "extra": 1 }));
        let out = divert(&src, &HashSet::new(), &HashSet::new(), Some("Unmapped dialpad field"));
        assert_eq!(
            out["extra"].description.as_deref(),
            Some("Unmapped dialpad field")
        );
    }

    #[test]
    fn divert_preserves_nested_values_whole() {
        let src = source(json!({ "settings": { "a": [1, 2], "b": null } }));
        let out = divert(&src, &HashSet::new(), &HashSet::new(), None);
        assert_eq!(out["settings"].value, json!({ "a": [1, 2], "b": null }));
    }

    #[test]
    fn divert_is_insensitive_to_source_key_order() {
        let a = source(json!({ "x": 1, "y": 2, "z": 3 }));
        let b = source(json!({ "z": 3, "x": 1, "y": 2 }));
        let consumed: HashSet<&str> = ["y"].into();
        assert_eq!(
            divert(&a, &consumed, &HashSet::new(), None),
            divert(&b, &consumed, &HashSet::new(), None)
        );
    }

    #[test]
    fn reinject_restores_values_and_ignores_descriptions() {
        let src = source(json!({ "a": 1, "b": { "c": true } }));
        let out = divert(&src, &HashSet::new(), &HashSet::new(), Some("note"));
        let restored = reinject(&out);
        assert_eq!(Value::Object(restored), json!({ "a": 1, "b": { "c": true } }));
    }

    #[test]
    fn merge_prefers_newer_values_but_keeps_old_descriptions() {
        let mut existing = UnmappedMetadata::new();
        existing.insert(
            "a".to_string(),
            UnmappedEntry {
                value: json!(1),
                description: Some("original".to_string()),
            },
        );

        let mut newer = UnmappedMetadata::new();
        newer.insert(
            "a".to_string(),
            UnmappedEntry {
                value: json!(2),
                description: None,
            },
        );
        newer.insert(
            "b".to_string(),
            UnmappedEntry {
                value: json!(3),
                description: Some("new".to_string()),
            },
        );

        let merged = merge(&existing, &newer);
        assert_eq!(merged["a"].value, json!(2));
        assert_eq!(merged["a"].description.as_deref(), Some("original"));
        assert_eq!(merged["b"].value, json!(3));
        assert_eq!(merged["b"].description.as_deref(), Some("new"));
    }
}
