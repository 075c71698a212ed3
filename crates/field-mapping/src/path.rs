//! Dot-addressed paths into nested JSON records (e.g. `person.email`).

use serde_json::{Map, Value};

/// A parsed, validated dot-addressed field path.
///
/// Paths address nested object fields only; array indexing is intentionally
/// unsupported (array-valued fields are mapped whole and shaped by coercions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot path.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty path or a path with an empty segment
    /// (`"a..b"`, `".a"`, `"a."`).
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("field path must not be empty".to_string());
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(format!("field path '{raw}' contains an empty segment"));
        }
        Ok(FieldPath {
            raw: raw.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// First segment; used for top-level diversion bookkeeping.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Read the value at this path, if present.
    #[must_use]
    pub fn get<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        let mut cur = record;
        for seg in &self.segments {
            cur = cur.as_object()?.get(seg)?;
        }
        Some(cur)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    ///
    /// Non-object intermediates (including the root) are replaced by objects.
    pub fn set(&self, record: &mut Value, value: Value) {
        set_at(record, &self.segments, value);
    }

    /// Take the value at this path out of the record, if present.
    ///
    /// Emptied intermediate objects are left in place.
    pub fn remove(&self, record: &mut Value) -> Option<Value> {
        let mut cur = record;
        for seg in &self.segments[..self.segments.len() - 1] {
            cur = cur.as_object_mut()?.get_mut(seg)?;
        }
        cur.as_object_mut()?
            .remove(&self.segments[self.segments.len() - 1])
    }
}

fn set_at(cur: &mut Value, segments: &[String], value: Value) {
    if !cur.is_object() {
        *cur = Value::Object(Map::new());
    }
    let Value::Object(map) = cur else {
        return;
    };
    match segments {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let next = map.entry(head.clone()).or_insert(Value::Null);
            set_at(next, rest, value);
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rejects_empty_paths_and_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::parse("a.").is_err());
        assert!(FieldPath::parse("a..b").is_err());
    }

    #[test]
    fn parse_accepts_single_and_nested_segments() {
        let p = FieldPath::parse("email").unwrap();
        assert_eq!(p.root(), "email");
        assert_eq!(p.segments().len(), 1);

        let p = FieldPath::parse("person.contact.email").unwrap();
        assert_eq!(p.root(), "person");
        assert_eq!(p.segments().len(), 3);
    }

    #[test]
    fn get_reads_nested_values() {
        let record = json!({ "person": { "email": "a@b.com" } });
        let p = FieldPath::parse("person.email").unwrap();
        assert_eq!(p.get(&record), Some(&json!("a@b.com")));

        let missing = FieldPath::parse("person.name").unwrap();
        assert_eq!(missing.get(&record), None);
    }

    #[test]
    fn get_returns_none_through_non_objects() {
        let record = json!({ "person": "flat" });
        let p = FieldPath::parse("person.email").unwrap();
        assert_eq!(p.get(&record), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut out = json!({});
        FieldPath::parse("person.contact.email")
            .unwrap()
            .set(&mut out, json!("a@b.com"));
        assert_eq!(out, json!({ "person": { "contact": { "email": "a@b.com" } } }));
    }

    #[test]
    fn set_overwrites_non_object_intermediates() {
        let mut out = json!({ "person": 42 });
        FieldPath::parse("person.email")
            .unwrap()
            .set(&mut out, json!("a@b.com"));
        assert_eq!(out, json!({ "person": { "email": "a@b.com" } }));
    }

    #[test]
    fn remove_takes_the_value_out() {
        let mut record = json!({ "person": { "email": "a@b.com", "name": "Jo" } });
        let p = FieldPath::parse("person.email").unwrap();
        assert_eq!(p.remove(&mut record), Some(json!("a@b.com")));
        assert_eq!(record, json!({ "person": { "name": "Jo" } }));
        assert_eq!(p.remove(&mut record), None);
    }
}
